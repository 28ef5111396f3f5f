use hypertext::prelude::*;

use crate::pages::Body;

#[derive(Clone)]
pub struct Base<'a, T: Renderable> {
    pub head: Head<'a>,
    pub body: Body<'a, T>,
}

#[derive(Clone)]
pub struct Head<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub author: &'a str,
    /// Site-absolute URLs, in link order.
    pub stylesheets: &'a [String],
}

impl<T: Renderable> Renderable for Base<'_, T> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        rsx! {
            <!DOCTYPE html>
            <html>
                (self.head)
                (self.body)
            </html>
        }
        .render_to(buffer);
    }
}

impl Renderable for Head<'_> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        rsx! {
            <head>
                <meta charset="UTF-8">
                <meta name="viewport" content="width=device-width, initial-scale=1">

                <title>(self.title)</title>

                @if let Some(description) = self.description {
                    <meta name="description" content=(description)>
                }
                <meta name="author" content=(self.author)>

                @for href in self.stylesheets {
                    <link rel="stylesheet" href=(href)>
                }
            </head>
        }
        .render_to(buffer);
    }
}
