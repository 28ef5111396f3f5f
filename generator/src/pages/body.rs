use hypertext::{Raw, prelude::*};

use crate::pages::{PageToc, Sidebar};

#[derive(Clone)]
pub struct Body<'a, T: Renderable> {
    pub header: Header<'a>,
    pub sidebar: Option<Sidebar<'a>>,
    pub page_toc: Option<PageToc<'a>>,
    pub footer: Footer<'a>,
    pub main: T,
}

/// Rendered page content.
#[derive(Clone)]
pub struct Article<'a> {
    pub raw_html: &'a str,
}

#[derive(Clone)]
pub struct Header<'a> {
    pub project: &'a str,
}

#[derive(Clone)]
pub struct Footer<'a> {
    pub copyright: Option<&'a str>,
    pub last_updated: Option<&'a str>,
}

impl<T: Renderable> Renderable for Body<'_, T> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        rsx! {
            <body>
                (self.header)
                <main>
                    @if let Some(sidebar) = &self.sidebar {
                        (sidebar)
                    }
                    (self.main)
                    @if let Some(page_toc) = &self.page_toc {
                        (page_toc)
                    }
                </main>
                (self.footer)
            </body>
        }
        .render_to(buffer);
    }
}

impl Renderable for Header<'_> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        rsx! {
            <header>
                <div class="header-home">
                    <a href="/">(self.project)</a>
                </div>
            </header>
        }
        .render_to(buffer);
    }
}

impl Renderable for Footer<'_> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        rsx! {
            <footer>
                <div class="footer-copyright">
                    @if let Some(copyright) = self.copyright {
                        <p>"© " (copyright)</p>
                    }
                </div>

                <div class="footer-updated">
                    @if let Some(last_updated) = self.last_updated {
                        <p>"Last updated on " (last_updated)</p>
                    }
                </div>
            </footer>
        }
        .render_to(buffer);
    }
}

impl Renderable for Article<'_> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        rsx! {
            <article class="markdown" id="content">
                (Raw::dangerously_create(&self.raw_html))
            </article>
        }
        .render_to(buffer);
    }
}
