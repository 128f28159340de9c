// Entry points a host calls at save time, render time, and for the
// `<noautolinks>` / `<autolinks>` tags. The host's parser is passed in as a
// closure; the tags arrange the engine's reentrancy lock around it.

use tracing::debug;

use crate::engine::LinkEngine;
use crate::error::LinkError;
use crate::source::Source;
use crate::title::PageTitle;

/// Link a page being saved. Minor edits and disabled `parse_on_edit` are
/// skipped. On change the source's text is replaced and also returned.
pub fn on_content_save(
    engine: &LinkEngine<'_>,
    source: &mut Source,
    minor: bool,
) -> Result<Option<String>, LinkError> {
    if !engine.config().parse_on_edit || minor {
        return Ok(None);
    }
    let linked = engine.link_content(source)?;
    if let Some(text) = &linked {
        debug!(page = %source.title()?, "links added on save");
        source.set_text(text.clone());
    }
    Ok(linked)
}

/// Link text on its way to the renderer; nothing is stored. Returns whether
/// `text` was changed.
pub fn on_render(
    engine: &LinkEngine<'_>,
    title: &PageTitle,
    text: &mut String,
) -> Result<bool, LinkError> {
    if !engine.config().parse_on_render {
        return Ok(false);
    }
    let mut source = Source::from_text(title.clone(), text.as_str());
    match engine.link_content(&mut source)? {
        Some(linked) => {
            *text = linked;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// `<noautolinks>`: parse the body with linking switched off.
pub fn noautolinks_tag<F, T>(engine: &LinkEngine<'_>, body: &str, parse: F) -> T
where
    F: FnOnce(&str) -> T,
{
    let _held = engine.lock().hold();
    parse(body)
}

/// `<autolinks>`: link the body even inside a locked region, then parse the
/// result with the previous lock state restored.
pub fn autolinks_tag<F, T>(
    engine: &LinkEngine<'_>,
    title: &PageTitle,
    body: &str,
    parse: F,
) -> Result<T, LinkError>
where
    F: FnOnce(&str) -> T,
{
    let linked = {
        let _open = engine.lock().suspend();
        engine.link_content(&mut Source::from_text(title.clone(), body))?
    };
    Ok(parse(linked.as_deref().unwrap_or(body)))
}
