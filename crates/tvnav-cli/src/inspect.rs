use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use tvnav::{Direction, Layout, NavHost, NavId, Navigator, RecordingHost, check_structure};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Args)]
pub struct LinksArgs {
    /// Layout file (.toml or .json).
    pub layout: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Layout file (.toml or .json).
    pub layout: PathBuf,
}

fn mount(layout: &Layout) -> Result<Navigator<RecordingHost>> {
    let mut nav = Navigator::new(RecordingHost::new());
    layout.mount(&mut nav)?;
    Ok(nav)
}

/// Nodes in document order, paired with their depth.
fn preorder<H: NavHost>(nav: &Navigator<H>) -> Vec<(NavId, usize)> {
    let mut out = Vec::new();
    let mut stack: Vec<(NavId, usize)> = nav.root().map(|r| (r, 0)).into_iter().collect();
    while let Some((id, depth)) = stack.pop() {
        out.push((id, depth));
        stack.extend(nav.tree().children(id).iter().rev().map(|c| (*c, depth + 1)));
    }
    out
}

/// One line per node: indented label followed by its resolved links.
pub fn link_table(layout: &Layout) -> Result<Vec<String>> {
    let nav = mount(layout)?;
    let tree = nav.tree();
    let lines = preorder(&nav)
        .into_iter()
        .map(|(id, depth)| {
            let links: Vec<String> = Direction::ALL
                .iter()
                .map(|&dir| {
                    let target = tree
                        .link(id, dir)
                        .map_or_else(|| "-".to_owned(), |t| tree.label(t).to_string());
                    let marker = if tree.get(id).is_some_and(|n| n.is_explicit_link(dir)) {
                        "*"
                    } else {
                        ""
                    };
                    format!("{dir}={target}{marker}")
                })
                .collect();
            format!("{}{}: {}", "  ".repeat(depth), tree.label(id), links.join(" "))
        })
        .collect();
    Ok(lines)
}

pub fn run_links(args: LinksArgs, out: &mut impl Write) -> Result<()> {
    let layout = Layout::from_path(&args.layout)?;
    for line in link_table(&layout)? {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Mount and validate; returns the label of the initially focused node.
pub fn check(layout: &Layout) -> Result<Option<String>> {
    let nav = mount(layout)?;
    check_structure(nav.tree()).map_err(|message| CliError::exit(1, message))?;
    Ok(nav.current().map(|id| nav.tree().label(id).to_string()))
}

pub fn run_check(args: CheckArgs, out: &mut impl Write) -> Result<()> {
    let layout = Layout::from_path(&args.layout)?;
    match check(&layout)? {
        Some(focused) => {
            writeln!(out, "ok: {} nodes, initial focus {focused}", layout.nodes().len())?;
            Ok(())
        }
        None => Err(CliError::NoFocus { path: args.layout }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_table_marks_explicit_links() {
        let layout = Layout::from_json_str(
            r#"{"root": {"id": "col", "children": [
                {"id": "a", "focusable": true, "left": "b"},
                {"id": "b", "focusable": true}
            ]}}"#,
        )
        .unwrap();
        let lines = link_table(&layout).unwrap();
        assert_eq!(
            lines,
            vec![
                "col: up=- right=- down=- left=-".to_owned(),
                "  a: up=- right=- down=b left=b*".to_owned(),
                "  b: up=a right=- down=- left=-".to_owned(),
            ]
        );
    }

    #[test]
    fn check_reports_initial_focus() {
        let layout = Layout::from_json_str(
            r#"{"root": {"id": "r", "children": [{"id": "panel", "children": [{"id": "x", "focusable": true}]}]}}"#,
        )
        .unwrap();
        assert_eq!(check(&layout).unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn check_fails_without_focusable_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, r#"{"root": {"id": "r", "children": [{"id": "panel"}]}}"#).unwrap();
        let err = run_check(CheckArgs { layout: path }, &mut Vec::<u8>::new()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_NO_FOCUS);
    }
}
