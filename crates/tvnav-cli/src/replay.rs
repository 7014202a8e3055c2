use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tvnav::{KeyEvent, Layout, NavHost, NavId, Navigator, NavigatorConfig, RecordingHost};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// Layout file (.toml or .json).
    pub layout: PathBuf,

    /// Comma-separated key names, e.g. `ArrowDown,Tab,Shift+Tab,Enter`.
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub keys: Vec<String>,

    /// Emit one JSON object per step instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Disable the Tab friend-direction retry (overrides `TVNAV_TAB_FALLBACK`).
    #[arg(long = "no-tab-fallback")]
    pub no_tab_fallback: bool,
}

/// One row of replay output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayStep {
    pub step: usize,
    /// Key as typed; `None` for the initial state.
    pub key: Option<String>,
    pub focused: Option<String>,
    pub moved: bool,
    pub activated: bool,
}

pub fn parse_keys(keys: &[String]) -> Result<Vec<KeyEvent>> {
    keys.iter()
        .map(|key| {
            KeyEvent::parse(key).map_err(|source| CliError::InvalidKey {
                key: key.clone(),
                source,
            })
        })
        .collect()
}

fn label<H: NavHost>(nav: &Navigator<H>, id: Option<NavId>) -> Option<String> {
    id.map(|id| nav.tree().label(id).to_string())
}

/// Mount `layout`, feed `keys`, and record where focus sits after each one.
pub fn replay(layout: &Layout, keys: &[String], config: NavigatorConfig) -> Result<Vec<ReplayStep>> {
    let events = parse_keys(keys)?;
    let mut nav = Navigator::with_config(RecordingHost::new(), config);
    layout.mount(&mut nav)?;

    let mut steps = Vec::with_capacity(events.len() + 1);
    steps.push(ReplayStep {
        step: 0,
        key: None,
        focused: label(&nav, nav.current()),
        moved: false,
        activated: false,
    });
    for (i, (name, event)) in keys.iter().zip(&events).enumerate() {
        let outcome = nav.handle_key(event);
        tracing::debug!(key = %name, moved = outcome.moved, "replayed key");
        steps.push(ReplayStep {
            step: i + 1,
            key: Some(name.trim().to_owned()),
            focused: label(&nav, nav.current()),
            moved: outcome.moved,
            activated: outcome.activated,
        });
    }
    Ok(steps)
}

pub fn write_steps(out: &mut impl Write, steps: &[ReplayStep], json: bool) -> Result<()> {
    for step in steps {
        if json {
            serde_json::to_writer(&mut *out, step)?;
            writeln!(out)?;
        } else {
            let mut flags = String::new();
            if step.moved {
                flags.push_str(" moved");
            }
            if step.activated {
                flags.push_str(" activated");
            }
            writeln!(
                out,
                "{:>3}  {:<12} {}{}",
                step.step,
                step.key.as_deref().unwrap_or("(initial)"),
                step.focused.as_deref().unwrap_or("-"),
                flags
            )?;
        }
    }
    Ok(())
}

pub fn run_replay(args: ReplayArgs, out: &mut impl Write) -> Result<()> {
    let layout = Layout::from_path(&args.layout)?;
    let mut config = NavigatorConfig::from_env();
    if args.no_tab_fallback {
        config = config.with_tab_fallback(false);
    }
    let steps = replay(&layout, &args.keys, config)?;
    write_steps(out, &steps, args.json)
}
