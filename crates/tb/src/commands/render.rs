//! `tb render` command implementation.

use std::path::PathBuf;

use clap::Args;
use tb_api::Post;
use tb_content::{Element, Node, RenderOutput, serialize_element};

use super::{GlobalArgs, body_source, content_renderer};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// HTML file with the post body (default: stdin).
    file: Option<PathBuf>,

    /// Fetch the post with this slug from the blog API.
    #[arg(long, conflicts_with_all = ["file", "id"])]
    slug: Option<String>,

    /// Fetch the post with this id from the blog API.
    #[arg(long, conflicts_with = "file")]
    id: Option<u64>,

    /// Write the result to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Wrap the body in a standalone HTML page.
    #[arg(long)]
    wrap: bool,

    /// Do not wrap images in loading placeholders.
    #[arg(long)]
    no_images: bool,
}

impl RenderArgs {
    /// Execute the render command.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = global.load_config()?;

        let source = body_source(self.file.as_deref(), self.slug.as_deref(), self.id);
        let body = source.read(&config)?;

        let mut renderer = content_renderer(&config, !self.no_images);
        let rendered = renderer.render(&body.html)?;
        print_summary(&output, &rendered);

        let html = if self.wrap || config.render.wrap {
            wrap_page(&rendered.html(), body.post.as_ref())
        } else {
            rendered.html()
        };

        match &self.output {
            Some(path) => {
                std::fs::write(path, &html)?;
                output.success(&format!("Wrote {}", path.display()));
            }
            None => Output::document(&html)?,
        }
        Ok(())
    }
}

fn print_summary(output: &Output, rendered: &RenderOutput) {
    let total = rendered.blocks().len();
    if total == 0 {
        return;
    }
    output.info(&format!(
        "Rendered {} of {total} diagram(s)",
        rendered.rendered_count()
    ));
    for warning in rendered.warnings() {
        output.warning(&format!("  ! {warning}"));
    }
}

/// Wrap a rendered body in a standalone page with the post header.
fn wrap_page(body: &str, post: Option<&Post>) -> String {
    let title = post.map_or("Post", |p| p.title.as_str());

    let head = Element::new("head")
        .with_child(Element::new("meta").with_attr("charset", "utf-8"))
        .with_child(Element::new("title").with_text(title));

    let mut article = Element::new("article").with_attr("class", "post");
    if let Some(post) = post {
        article.children.push(post_header(post).into());
    }
    article.children.push(
        Element::new("div")
            .with_attr("class", "post-body-text")
            .with_child(Node::Raw(body.to_owned()))
            .into(),
    );

    let html = Element::new("html")
        .with_child(head)
        .with_child(Element::new("body").with_child(article));
    format!("<!DOCTYPE html>\n{}\n", serialize_element(&html))
}

fn post_header(post: &Post) -> Element {
    let mut meta = Element::new("div").with_attr("class", "post-meta");
    if let Some(author) = &post.author {
        meta.children.push(
            Element::new("span")
                .with_attr("class", "author")
                .with_text(author.username.as_str())
                .into(),
        );
    }
    meta.children.push(
        Element::new("span")
            .with_attr("class", "date")
            .with_text(post.display_date())
            .into(),
    );
    meta.children.push(
        Element::new("span")
            .with_attr("class", "category")
            .with_text(post.category_name())
            .into(),
    );

    let mut header = Element::new("header")
        .with_child(Element::new("h1").with_text(post.title.as_str()))
        .with_child(meta);

    let tags = post.tag_names();
    if !tags.is_empty() {
        let list = tags.iter().fold(
            Element::new("ul").with_attr("class", "tags"),
            |list, tag| list.with_child(Element::new("li").with_text(format!("#{tag}"))),
        );
        header.children.push(list.into());
    }
    header
}
