//! Commands installed by the `xlev`, `mime` and `lang` capabilities.

use dico::strategy::LevenshteinSelector;
use dico::stream::StreamError;
use dico::{Strategy, StrategyRegistry};

use super::capability::{CapabilityError, CapabilityRegistry};
use super::registry::CommandDescriptor;
use super::Context;
use super::builtin::INVALID_DATABASE;

pub(super) fn register(registry: &mut CapabilityRegistry) {
    registry.register(
        "xlev",
        vec![CommandDescriptor::exact(
            "XLEV",
            2,
            "distance",
            "set or query Levenshtein distance (TELL)",
            xlev,
        )],
        Some(ensure_levenshtein),
    );
    registry.register(
        "mime",
        vec![CommandDescriptor::exact(
            "OPTION MIME",
            2,
            "",
            "use MIME headers",
            option_mime,
        )],
        None,
    );
    registry.register(
        "lang",
        vec![
            CommandDescriptor::exact(
                "SHOW LANG DB",
                3,
                "",
                "show databases with their language preferences",
                show_lang_databases,
            ),
            CommandDescriptor::exact(
                "SHOW LANG DATABASES",
                3,
                "",
                "show databases with their language preferences",
                show_lang_databases,
            ),
            CommandDescriptor::exact(
                "SHOW LANG INFO",
                4,
                "database",
                "show language preferences of a database",
                show_lang_info,
            ),
        ],
        None,
    );
}

/// XLEV is pointless without the distance-based strategies.
fn ensure_levenshtein(strategies: &mut StrategyRegistry) -> Result<(), CapabilityError> {
    if !strategies.contains("lev") {
        strategies.register(Strategy::new(
            "lev",
            "Match headwords within given Levenshtein distance",
            LevenshteinSelector::plain(),
        ));
    }
    if !strategies.contains("dlev") {
        strategies.register(Strategy::new(
            "dlev",
            "Match headwords within given Damerau-Levenshtein distance",
            LevenshteinSelector::damerau(),
        ));
    }
    Ok(())
}

fn xlev(ctx: &mut Context<'_>, args: &[String]) -> Result<(), StreamError> {
    let [_, value] = args else {
        return ctx.reply(501, "wrong number of arguments");
    };
    if value.eq_ignore_ascii_case("tell") {
        let distance = ctx.state.lev_distance;
        return ctx.reply(280, &distance.to_string());
    }
    match value.as_bytes() {
        [digit @ b'1'..=b'9'] => {
            let distance = usize::from(digit - b'0');
            ctx.state.lev_distance = distance;
            ctx.reply(250, &format!("ok - Levenshtein threshold set to {distance}"))
        }
        _ => ctx.reply(500, "invalid argument"),
    }
}

fn option_mime(ctx: &mut Context<'_>, _args: &[String]) -> Result<(), StreamError> {
    ctx.state.mime = true;
    ctx.reply(250, "ok - using MIME headers")
}

fn language_list(languages: &[&str]) -> String {
    let mut text = languages.len().to_string();
    for language in languages {
        text.push(' ');
        text.push_str(language);
    }
    text
}

fn show_lang_databases(ctx: &mut Context<'_>, _args: &[String]) -> Result<(), StreamError> {
    let engine = ctx.engine;
    let visible: Vec<_> = engine.databases().filter(|db| !db.is_hidden()).collect();
    if visible.is_empty() {
        return ctx.reply(554, "No databases present");
    }
    ctx.list(
        110,
        &format!("{} databases present", visible.len()),
        visible.iter().map(|db| {
            format!("{} {}", db.name(), language_list(&db.languages().merged()))
        }),
    )
}

fn show_lang_info(ctx: &mut Context<'_>, args: &[String]) -> Result<(), StreamError> {
    let [_, _, _, name] = args else {
        return ctx.reply(501, "wrong number of arguments");
    };
    let engine = ctx.engine;
    let Some(database) = engine.database(name) else {
        return ctx.reply(550, INVALID_DATABASE);
    };
    ctx.reply(280, &language_list(&database.languages().merged()))
}
