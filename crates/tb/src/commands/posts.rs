//! `tb posts` command implementation.

use clap::Args;
use tb_api::{Post, PostPage};
use tb_content::{excerpt, slugify};

use super::{GlobalArgs, api_client};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the posts command.
#[derive(Args)]
pub(crate) struct PostsArgs {
    /// Zero-based page number.
    #[arg(long, default_value_t = 0)]
    page: u32,

    /// Posts per page.
    #[arg(long, default_value_t = 10)]
    size: u32,

    /// Only posts in this category.
    #[arg(long)]
    category: Option<String>,

    /// Print the raw page as JSON on stdout.
    #[arg(long)]
    json: bool,
}

impl PostsArgs {
    /// Execute the posts command.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = global.load_config()?;
        let client = api_client(&config)?;

        let page = client.list_posts(self.page, self.size, self.category.as_deref())?;

        if self.json {
            Output::document(&serde_json::to_string_pretty(&page)?)?;
            return Ok(());
        }

        print_page(&output, &page, config.render.excerpt_length)?;
        Ok(())
    }
}

fn print_page(output: &Output, page: &PostPage, excerpt_length: usize) -> Result<(), CliError> {
    if page.content.is_empty() {
        output.info("No posts found.");
        return Ok(());
    }

    for post in &page.content {
        output.highlight(&post.title);
        output.info(&summary_line(post));
        output.detail(&format!("  {}", excerpt(&post.content, excerpt_length)?));
    }

    output.info(&format!(
        "\nPage {} of {} ({} post(s) total)",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements
    ));
    Ok(())
}

fn summary_line(post: &Post) -> String {
    let author = post.author.as_ref().map_or("unknown", |a| a.username.as_str());
    format!(
        "  {} | {} | {author} | /post/{} | {} like(s), {} view(s)",
        post.display_date(),
        post.category_name(),
        slugify(&post.title),
        post.like_count,
        post.view_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tb_api::Author;

    #[test]
    fn test_summary_line() {
        let post = Post {
            title: "Hello World".to_owned(),
            published_at: Some("2024-01-02T03:04:05".to_owned()),
            author: Some(Author {
                username: "kim".to_owned(),
                ..Author::default()
            }),
            like_count: 3,
            view_count: 40,
            ..Post::default()
        };
        assert_eq!(
            summary_line(&post),
            "  Jan 02, 2024 | Uncategorized | kim | /post/Hello-World | 3 like(s), 40 view(s)"
        );
    }
}
