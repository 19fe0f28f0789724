//! Serving a story: internal ID markers become real URLs again and the pages
//! are placed into the AMP story document.

use std::fmt::Write;

use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::rendition::get_rendition;
use ampstory_content::models::{FilterSpec, ImageId, PosterSlot, StoryPage};
use ampstory_content::{Expansion, Expansions, Reference, expand, scan};
use exn::{OptionExt, ResultExt};
use rust_embed::Embed;
use tracing::instrument;
use upon::{Engine, Template, Value};

#[derive(Embed)]
#[folder = "../../assets/templates/"]
struct Templates;

const STORY_TEMPLATE: &str = "story.html";
/// Required AMP `<style amp-boilerplate>` markup. Its CSS is full of `}}`, so
/// it is passed to the template as a value rather than written into it.
const BOILERPLATE: &str = "amp-boilerplate.html";

fn asset(name: &str) -> Result<String> {
    let file = Templates::get(name).ok_or_raise(|| ErrorKind::Template)?;
    String::from_utf8(file.data.into_owned()).or_raise(|| ErrorKind::Template)
}

/// Default formatter: strings are escaped for HTML text and quoted attributes.
fn escape_html(f: &mut upon::fmt::Formatter<'_>, value: &Value) -> upon::fmt::Result {
    let Value::String(text) = value else {
        return upon::fmt::default(f, value);
    };
    let mut rest = text.as_str();
    while let Some(position) = rest.find(['&', '<', '>', '"', '\'']) {
        f.write_str(&rest[..position])?;
        f.write_str(match rest.as_bytes()[position] {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            _ => "&#39;",
        })?;
        rest = &rest[position + 1..];
    }
    f.write_str(rest)?;
    Ok(())
}

struct StoryTemplate {
    engine: Engine<'static>,
    template: Template<'static>,
    boilerplate: String,
}
impl StoryTemplate {
    fn load() -> Result<Self> {
        let mut engine = Engine::new();
        engine.set_default_formatter(&escape_html);
        // Page markup, boilerplate and custom CSS are authored HTML, not text.
        engine.add_formatter("raw", upon::fmt::default);
        let template = engine.compile(asset(STORY_TEMPLATE)?).or_raise(|| ErrorKind::Template)?;
        Ok(Self { engine, template, boilerplate: asset(BOILERPLATE)? })
    }
}

/// Public URL of the rendition of image `id` for `spec`.
///
/// `None` (with a warning) if the image no longer exists.
async fn image_src(ctx: &Context, id: ImageId, spec: FilterSpec) -> Result<Option<String>> {
    let Some(image) = ctx.catalog().get_image(id).await.or_raise(|| ErrorKind::Catalog)? else {
        tracing::warn!(image_id = %id, "Referenced image is missing");
        return Ok(None);
    };
    let rendition = get_rendition(ctx, &image, spec).await?;
    Ok(Some(ctx.url(&rendition.file)))
}

/// URL for the publisher logo: the local logo's rendition if there is one,
/// otherwise the remote URL as recorded.
pub async fn publisher_logo_src(ctx: &Context, story: &StoryPage) -> Result<Option<String>> {
    if let Some(id) = story.publisher_logo
        && let Some(src) = image_src(ctx, id, FilterSpec::PUBLISHER_LOGO).await?
    {
        return Ok(Some(src));
    }
    Ok(story.publisher_logo_src_original().map(str::to_string))
}

/// URL for one poster aspect ratio, the same way as [`publisher_logo_src`].
pub async fn poster_src(ctx: &Context, story: &StoryPage, slot: PosterSlot) -> Result<Option<String>> {
    if let Some(id) = story.poster_image
        && let Some(src) = image_src(ctx, id, slot.filter_spec()).await?
    {
        return Ok(Some(src));
    }
    Ok(story.poster_src_original(slot).map(str::to_string))
}

/// [`poster_src`] for the portrait slot.
pub async fn poster_portrait_src(ctx: &Context, story: &StoryPage) -> Result<Option<String>> {
    poster_src(ctx, story, PosterSlot::Portrait).await
}

/// [`poster_src`] for the square slot.
pub async fn poster_square_src(ctx: &Context, story: &StoryPage) -> Result<Option<String>> {
    poster_src(ctx, story, PosterSlot::Square).await
}

/// [`poster_src`] for the landscape slot.
pub async fn poster_landscape_src(ctx: &Context, story: &StoryPage) -> Result<Option<String>> {
    poster_src(ctx, story, PosterSlot::Landscape).await
}

/// Replace the ID markers in one fragment with `src` URLs.
///
/// Images point at their `original` rendition and get `width`/`height` if
/// the element has none. References to assets that no longer exist are
/// left as they are.
#[instrument(skip_all, fields(html_size = html.len()))]
pub async fn expand_html(ctx: &Context, html: &str) -> Result<String> {
    let mut expansions = Expansions::default();
    for reference in scan(html) {
        match reference {
            Reference::ImageId { id } => {
                let Some(image) = ctx.catalog().get_image(id).await.or_raise(|| ErrorKind::Catalog)? else {
                    continue;
                };
                let rendition = get_rendition(ctx, &image, FilterSpec::Original).await?;
                expansions
                    .insert_image(id, Expansion::new(ctx.url(&rendition.file)).with_size(rendition.width, rendition.height));
            },
            Reference::VideoId { id } => {
                let Some(media) = ctx.catalog().get_media(id).await.or_raise(|| ErrorKind::Catalog)? else {
                    continue;
                };
                expansions.insert_media(id, Expansion::new(ctx.url(&media.file)));
            },
            Reference::ImageUrl { .. } | Reference::VideoSourceUrl { .. } => {},
        }
    }
    Ok(expand(html, &expansions).into_owned())
}

/// Render the complete AMP document for a story.
#[instrument(skip_all, fields(slug = %story.slug))]
pub async fn render_story(ctx: &Context, story: &StoryPage) -> Result<String> {
    let template = StoryTemplate::load()?;
    let mut pages = Vec::with_capacity(story.pages.len());
    for page in &story.pages {
        let html = expand_html(ctx, &page.html).await?;
        pages.push(upon::value! { id: page.id.as_str(), html: html });
    }
    let parameters = upon::value! {
        title: story.title.as_str(),
        publisher: story.publisher.as_str(),
        publisher_logo_src: publisher_logo_src(ctx, story).await?,
        poster_portrait_src: poster_portrait_src(ctx, story).await?,
        poster_square_src: poster_square_src(ctx, story).await?,
        poster_landscape_src: poster_landscape_src(ctx, story).await?,
        boilerplate: template.boilerplate.trim(),
        custom_css: story.custom_css.trim(),
        pages: pages,
    };
    template.template.render(&template.engine, parameters).to_string().or_raise(|| ErrorKind::Template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_story_template_compiles() {
        let template = StoryTemplate::load().unwrap();
        assert!(template.boilerplate.starts_with("<style amp-boilerplate>"));
        assert!(template.boilerplate.contains("<noscript>"));
    }

    #[rstest]
    #[case::plain("Wagtails", "Wagtails")]
    #[case::ampersand("Wagtails & friends", "Wagtails &amp; friends")]
    #[case::markup("<b>bold</b>", "&lt;b&gt;bold&lt;/b&gt;")]
    #[case::quotes(r#"a "b" 'c'"#, "a &quot;b&quot; &#39;c&#39;")]
    #[case::multibyte("café & crème", "café &amp; crème")]
    fn test_escape_html(#[case] text: &str, #[case] expected: &str) {
        let mut engine = Engine::new();
        engine.set_default_formatter(&escape_html);
        engine.add_formatter("raw", upon::fmt::default);
        let template = engine.compile("{{ text }}|{{ text|raw }}").unwrap();
        let rendered = template.render(&engine, upon::value! { text: text }).to_string().unwrap();
        assert_eq!(rendered, format!("{expected}|{text}"));
    }

    #[test]
    fn test_escape_html_formats_other_values() {
        let mut engine = Engine::new();
        engine.set_default_formatter(&escape_html);
        let template = engine.compile("{{ n }} {{ yes }}").unwrap();
        let rendered = template.render(&engine, upon::value! { n: 640, yes: true }).to_string().unwrap();
        assert_eq!(rendered, "640 true");
    }
}
