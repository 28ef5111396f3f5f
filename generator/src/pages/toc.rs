use hypertext::prelude::*;

use crate::markdown::Heading;

/// Links to the sections of the current page.
#[derive(Clone)]
pub struct PageToc<'a> {
    pub headings: &'a [Heading],
}

impl Renderable for PageToc<'_> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        let level_class = |heading: &Heading| format!("level-{}", heading.level);
        let href = |heading: &Heading| format!("#{}", heading.id);

        rsx! {
            <nav class="page-toc">
                <p class="page-toc-title">"On this page"</p>
                <ul>
                    @for heading in self.headings {
                        <li class=(level_class(heading))>
                            <a href=(href(heading))>(heading.text)</a>
                        </li>
                    }
                </ul>
            </nav>
        }
        .render_to(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: u8, text: &str, id: &str) -> Heading {
        Heading {
            level,
            text: text.to_string(),
            id: id.to_string(),
        }
    }

    #[test]
    fn links_each_heading() {
        let headings = [
            heading(2, "Install", "heading-install"),
            heading(3, "From <source>", "heading-from-source"),
        ];

        let html = PageToc {
            headings: &headings,
        }
        .render()
        .into_inner();

        assert!(html.starts_with(r#"<nav class="page-toc">"#));
        assert!(html.contains(r##"<li class="level-2"><a href="#heading-install">Install</a></li>"##));
        assert!(html.contains(r##"<a href="#heading-from-source">From &lt;source&gt;</a>"##));
    }
}
