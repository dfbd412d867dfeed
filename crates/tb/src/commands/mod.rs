//! CLI command implementations.

pub(crate) mod posts;
pub(crate) mod render;
pub(crate) mod scan;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use tb_api::{Post, PostClient};
use tb_config::{CliSettings, Config, OutputFormat};
use tb_content::{ContentRenderer, RenderOptions};
use tb_diagrams::consts::CACHE_VERSION;
use tb_diagrams::{DiagramFormat, FileDiagramCache, KrokiRenderer};
use tracing::info;

use crate::error::CliError;

pub(crate) use posts::PostsArgs;
pub(crate) use render::RenderArgs;
pub(crate) use scan::ScanArgs;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover techblog.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable info-level logging.
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,

    /// Blog API base URL (overrides config).
    #[arg(long, global = true, env = "TB_API_URL")]
    api_url: Option<String>,

    /// Kroki server URL for diagram rendering (overrides config).
    #[arg(long, global = true, env = "TB_KROKI_URL")]
    kroki_url: Option<String>,

    /// Disable the diagram cache.
    #[arg(long, global = true)]
    no_cache: bool,
}

impl GlobalArgs {
    /// Load configuration with command-line overrides applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let settings = CliSettings {
            api_url: self.api_url.clone(),
            kroki_url: self.kroki_url.clone(),
            cache_enabled: self.no_cache.then_some(false),
        };
        Ok(Config::load(self.config.as_deref(), Some(&settings))?)
    }
}

/// Where a post body comes from.
pub(crate) enum BodySource<'a> {
    /// The blog API, by slug.
    Slug(&'a str),
    /// The blog API, by id.
    Id(u64),
    /// A file, or stdin when `None` or `-`.
    File(Option<&'a Path>),
}

/// A post body plus the post it belongs to, when fetched from the API.
pub(crate) struct Body {
    pub(crate) html: String,
    pub(crate) post: Option<Post>,
}

impl BodySource<'_> {
    /// Read the body.
    pub(crate) fn read(&self, config: &Config) -> Result<Body, CliError> {
        let post = match self {
            Self::Slug(slug) => api_client(config)?.get_post_by_slug(slug)?,
            Self::Id(id) => api_client(config)?.get_post_by_id(*id)?,
            Self::File(path) => {
                let html = match path {
                    Some(path) if *path != Path::new("-") => std::fs::read_to_string(path)?,
                    _ => std::io::read_to_string(std::io::stdin())?,
                };
                return Ok(Body { html, post: None });
            }
        };
        Ok(Body {
            html: post.content.clone(),
            post: Some(post),
        })
    }
}

/// Blog API client from config.
pub(crate) fn api_client(config: &Config) -> Result<PostClient, CliError> {
    let base_url = config.require_api_url()?;
    let mut client = PostClient::new(base_url, Duration::from_secs(config.api.timeout_secs));
    if let Some(token) = &config.api.token {
        client = client.with_token(token.clone());
    }
    Ok(client)
}

/// Content renderer from config. Diagrams are rendered only when a Kroki URL
/// is configured.
pub(crate) fn content_renderer(config: &Config, image_placeholders: bool) -> ContentRenderer {
    let options = RenderOptions {
        image_placeholders,
        image_min_height: config.render.image_min_height,
        ..RenderOptions::default()
    };
    let renderer = ContentRenderer::new().with_options(options);

    let Some(kroki_url) = &config.diagrams.kroki_url else {
        info!("no Kroki URL configured, diagrams left as source");
        return renderer;
    };

    let format = match config.diagrams.format {
        OutputFormat::Svg => DiagramFormat::Svg,
        OutputFormat::Png => DiagramFormat::Png,
    };
    let mut kroki = KrokiRenderer::new(kroki_url)
        .with_format(format)
        .with_dpi(config.diagrams.dpi)
        .with_timeout(Duration::from_secs(config.diagrams.timeout_secs));

    if config.cache_resolved.enabled {
        let dir = config.cache_resolved.diagrams_dir();
        info!("diagram cache: {}", dir.display());
        kroki = kroki.with_cache(FileDiagramCache::new(dir, CACHE_VERSION));
    }

    renderer.with_diagrams(kroki)
}

/// Pick the body source from mutually exclusive arguments.
pub(crate) fn body_source<'a>(
    file: Option<&'a Path>,
    slug: Option<&'a str>,
    id: Option<u64>,
) -> BodySource<'a> {
    match (slug, id) {
        (Some(slug), _) => BodySource::Slug(slug),
        (None, Some(id)) => BodySource::Id(id),
        (None, None) => BodySource::File(file),
    }
}
