use hypertext::prelude::*;

use crate::{
    directives::Directive,
    outline::{EntryId, EntryKind, Outline},
};

/// Renders an indented `+ folder` / `- file` list as a nested list with icons.
pub struct FoldersDirective;

impl Directive for FoldersDirective {
    fn name(&self) -> &'static str {
        "folders"
    }

    fn stylesheets(&self) -> &'static [&'static str] {
        &["css/folders.css"]
    }

    fn render(&self, content: &str) -> String {
        let outline = Outline::parse(content);
        Folders { outline: &outline }.render().into_inner()
    }
}

struct Folders<'a> {
    outline: &'a Outline,
}

struct List<'a> {
    outline: &'a Outline,
    ids: &'a [EntryId],
}

struct Item<'a> {
    outline: &'a Outline,
    id: EntryId,
}

impl Renderable for Folders<'_> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        let list = List {
            outline: self.outline,
            ids: self.outline.roots(),
        };

        rsx! {
            <div class="line-block folders">
                (list)
            </div>
        }
        .render_to(buffer);
    }
}

impl Renderable for List<'_> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        rsx! {
            <ul>
                @for id in self.ids {
                    (Item { outline: self.outline, id: *id })
                }
            </ul>
        }
        .render_to(buffer);
    }
}

impl Renderable for Item<'_> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        let entry = self.outline.get(self.id);
        let is_folder = entry.kind == EntryKind::Folder;

        rsx! {
            <li class=(entry.kind.class())>
                <span>(entry.display_label())</span>
                // folders keep their list even when empty
                @if is_folder {
                    (List { outline: self.outline, ids: entry.children() })
                }
            </li>
        }
        .render_to(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(content: &str) -> String {
        FoldersDirective.render(content)
    }

    #[test]
    fn wraps_in_folders_block() {
        let html = render("");
        assert!(html.starts_with(r#"<div class="line-block folders">"#));
        assert!(html.contains("<ul></ul>"));
        assert!(html.ends_with("</div>"));
    }

    #[test]
    fn folder_and_files() {
        let html = render("+ docs\n  - readme.md\n  - license\n");

        assert!(html.contains(r#"<li class="folder"><span>📁 docs</span><ul>"#));
        assert!(html.contains(r#"<li class="file"><span>🖹 readme.md</span></li>"#));
        assert!(html.contains(r#"<li class="file"><span>🖹 license</span></li>"#));
        assert!(html.find("readme.md").unwrap() < html.find("license").unwrap());
    }

    #[test]
    fn empty_folder_keeps_list() {
        let html = render("+ empty\n");
        assert!(html.contains(r#"<span>📁 empty</span><ul></ul></li>"#));
    }

    #[test]
    fn files_have_no_list() {
        let html = render("- a\n");
        assert!(!html.contains(r#"</span><ul>"#));
    }

    #[test]
    fn labels_are_escaped() {
        let html = render("- <script>\n");
        assert!(html.contains("&lt;script"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn trailing_text_is_dropped() {
        let html = render("- x\nsome free text\n");
        assert!(html.contains("🖹 x"));
        assert!(!html.contains("free text"));
    }
}
