//! Commands of the base DICT protocol.

use std::sync::Arc;

use dico::stream::{ByteStream, StreamError};
use dico::{DatabaseError, DatabaseInstance, ResultHandle};
use tracing::{info, warn};

use crate::engine::Engine;

use super::registry::CommandDescriptor;
use super::stats::{QueryCounts, QueryTimer};
use super::{COMMANDS_TARGET, Context};

pub(super) const INVALID_DATABASE: &str = "invalid database, use SHOW DB for list";
const INVALID_STRATEGY: &str = "Invalid strategy, use \"SHOW STRAT\" for a list of strategies";
const NO_MATCH: &str = "No match";
const NO_INFORMATION: &str = "No information available.";

/// Database name searching databases in order until one answers.
pub(crate) const FIRST_MATCH: &str = "!";
/// Database name searching every database.
pub(crate) const ALL_DATABASES: &str = "*";

pub(super) const COMMANDS: [CommandDescriptor; 12] = [
    CommandDescriptor::exact("DEFINE", 3, "database word", "look up word in database", define),
    CommandDescriptor::exact(
        "MATCH",
        4,
        "database strategy word",
        "match word in database using strategy",
        match_word,
    ),
    CommandDescriptor::exact("SHOW DB", 2, "", "list all accessible databases", show_databases),
    CommandDescriptor::exact(
        "SHOW DATABASES",
        2,
        "",
        "list all accessible databases",
        show_databases,
    ),
    CommandDescriptor::exact(
        "SHOW STRAT",
        2,
        "",
        "list available matching strategies",
        show_strategies,
    ),
    CommandDescriptor::exact(
        "SHOW STRATEGIES",
        2,
        "",
        "list available matching strategies",
        show_strategies,
    ),
    CommandDescriptor::exact(
        "SHOW INFO",
        3,
        "database",
        "provide information about the database",
        show_info,
    ),
    CommandDescriptor::exact(
        "SHOW SERVER",
        2,
        "",
        "provide site-specific information",
        show_server,
    ),
    CommandDescriptor::exact("CLIENT", 2, "info", "identify client to server", client),
    CommandDescriptor {
        keyword: "STATUS",
        min_args: 1,
        max_args: Some(1),
        param_help: "",
        help: "display timing information",
        handler: None,
    },
    CommandDescriptor::exact("HELP", 1, "", "display this help information", help),
    CommandDescriptor::exact("QUIT", 1, "", "terminate connection", quit),
];

/// Databases a query runs against.
enum Scope<'e> {
    Named(&'e Arc<DatabaseInstance>),
    First,
    All,
}

impl<'e> Scope<'e> {
    fn resolve(engine: &'e Engine, name: &str) -> Option<Self> {
        match name {
            FIRST_MATCH => Some(Self::First),
            ALL_DATABASES => Some(Self::All),
            _ => engine.database(name).map(Self::Named),
        }
    }

    /// Runs `query` and keeps the non-empty results. Backend failures are
    /// logged and count as no result.
    fn collect<F>(self, engine: &Engine, mut query: F) -> Vec<ResultHandle>
    where
        F: FnMut(&Arc<DatabaseInstance>) -> Result<Option<ResultHandle>, DatabaseError>,
    {
        let mut run = |database: &Arc<DatabaseInstance>| match query(database) {
            Ok(Some(handle)) if !handle.is_empty() => Some(handle),
            Ok(_) => None,
            Err(error) => {
                warn!(
                    target: COMMANDS_TARGET,
                    database = %database.name(),
                    error = %error,
                    "query failed"
                );
                None
            }
        };
        match self {
            Self::Named(database) => run(database).into_iter().collect(),
            Self::First => engine
                .searchable()
                .find_map(|database| run(database))
                .into_iter()
                .collect(),
            Self::All => engine
                .searchable()
                .filter_map(|database| run(database))
                .collect(),
        }
    }
}

fn total(results: &[ResultHandle]) -> usize {
    results.iter().map(ResultHandle::count).sum()
}

fn define(ctx: &mut Context<'_>, args: &[String]) -> Result<(), StreamError> {
    let [_, database, word] = args else {
        return ctx.reply(501, "wrong number of arguments");
    };
    let engine = ctx.engine;
    let Some(scope) = Scope::resolve(engine, database) else {
        return ctx.reply(550, INVALID_DATABASE);
    };
    let timer = QueryTimer::start(engine.settings().timing);
    let key = ctx.key(word);
    let results = scope.collect(engine, |instance| instance.define(&key));
    let count = total(&results);
    if count == 0 {
        return ctx.reply(552, NO_MATCH);
    }
    ctx.reply(150, &format!("{count} definitions found: list follows"))?;
    let mime = ctx.state.mime;
    for handle in &results {
        for index in 0..handle.count() {
            let source = handle.database_for(index);
            ctx.reply(
                151,
                &format!(
                    "\"{word}\" {} \"{}\"",
                    source.name(),
                    source.description().unwrap_or_default()
                ),
            )?;
            let mut body = ctx.body();
            if mime {
                body = body.with_headers(handle.headers(index));
            }
            handle.output(index, &mut body)?;
            body.terminate()?;
        }
    }
    ctx.reply(250, &timer.status(QueryCounts::definitions(&results)))
}

fn match_word(ctx: &mut Context<'_>, args: &[String]) -> Result<(), StreamError> {
    let [_, database, strategy_name, word] = args else {
        return ctx.reply(501, "wrong number of arguments");
    };
    let engine = ctx.engine;
    let Some(scope) = Scope::resolve(engine, database) else {
        return ctx.reply(550, INVALID_DATABASE);
    };
    let Some(strategy) = engine.strategies().get(strategy_name) else {
        return ctx.reply(551, INVALID_STRATEGY);
    };
    let timer = QueryTimer::start(engine.settings().timing);
    let key = ctx.key(word);
    let results = scope.collect(engine, |instance| instance.match_word(strategy, &key));
    let count = total(&results);
    if count == 0 {
        return ctx.reply(552, NO_MATCH);
    }
    ctx.reply(152, &format!("{count} matches found: list follows"))?;
    let mut body = ctx.body();
    for handle in &results {
        for index in 0..handle.count() {
            let source = handle.database_for(index);
            body.write_str(source.name())?;
            body.write_str(" \"")?;
            handle.output(index, &mut body)?;
            body.write_str("\"\r\n")?;
        }
    }
    body.terminate()?;
    ctx.reply(250, &timer.status(QueryCounts::matches(&results)))
}

fn show_databases(ctx: &mut Context<'_>, _args: &[String]) -> Result<(), StreamError> {
    let engine = ctx.engine;
    let visible: Vec<_> = engine.databases().filter(|db| !db.is_hidden()).collect();
    if visible.is_empty() {
        return ctx.reply(554, "No databases present");
    }
    ctx.list(
        110,
        &format!("{} databases present", visible.len()),
        visible.iter().map(|db| {
            format!("{} \"{}\"", db.name(), db.description().unwrap_or_default())
        }),
    )
}

fn show_strategies(ctx: &mut Context<'_>, _args: &[String]) -> Result<(), StreamError> {
    let engine = ctx.engine;
    let strategies = engine.strategies();
    if strategies.is_empty() {
        return ctx.reply(555, "No strategies available");
    }
    ctx.list(
        111,
        &format!("{} strategies present: list follows", strategies.len()),
        strategies
            .iter()
            .map(|strategy| format!("{} \"{}\"", strategy.name(), strategy.description())),
    )
}

fn show_info(ctx: &mut Context<'_>, args: &[String]) -> Result<(), StreamError> {
    let [_, _, name] = args else {
        return ctx.reply(501, "wrong number of arguments");
    };
    let engine = ctx.engine;
    let Some(database) = engine.database(name) else {
        return ctx.reply(550, INVALID_DATABASE);
    };
    ctx.reply(112, &format!("information for {name}"))?;
    let mut body = ctx.body();
    body.write_str(database.info().unwrap_or(NO_INFORMATION))?;
    body.terminate()?;
    ctx.reply(250, "ok")
}

fn show_server(ctx: &mut Context<'_>, _args: &[String]) -> Result<(), StreamError> {
    let engine = ctx.engine;
    let info = engine.settings().server_info.as_str();
    ctx.reply(114, "server information")?;
    let mut body = ctx.body();
    body.write_str(info)?;
    body.terminate()?;
    ctx.reply(250, "ok")
}

fn client(ctx: &mut Context<'_>, args: &[String]) -> Result<(), StreamError> {
    if let [_, identification] = args {
        info!(target: COMMANDS_TARGET, client = %identification, "client identified");
        ctx.state.client = Some(identification.clone());
    }
    ctx.reply(250, "ok")
}

fn help(ctx: &mut Context<'_>, _args: &[String]) -> Result<(), StreamError> {
    let engine = ctx.engine;
    let configured = engine.settings().help_text.as_deref();
    let (standard, extra) = match configured {
        None => (true, None),
        Some(text) => text
            .strip_prefix('+')
            .map_or((false, Some(text)), |appended| (true, Some(appended))),
    };
    ctx.reply(113, "help text follows")?;
    let mut body = ctx.body();
    if standard {
        for command in engine.commands().iter() {
            body.write_str(&command.help_line())?;
            body.write_str("\r\n")?;
        }
    }
    if let Some(text) = extra {
        body.write_str(text)?;
    }
    body.terminate()?;
    ctx.reply(250, "ok")
}

fn quit(ctx: &mut Context<'_>, _args: &[String]) -> Result<(), StreamError> {
    ctx.state.quit = true;
    ctx.reply(221, "bye")
}
