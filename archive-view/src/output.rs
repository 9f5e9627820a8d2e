//! Terminal rendering of render descriptions.

use std::io::Write;

use colored::Colorize;
use metainfo_browser::{
    Navigator, RenderKind, RenderNode,
    render::{ListView, MetaInfo},
    search::SearchOption,
};

/// Write a node: its title line, meta details and one line per child, with
/// the visible windows of long lists beneath their entries.
pub fn write_node(out: &mut impl Write, node: &RenderNode) -> anyhow::Result<()> {
    let title = format!("{} [{}]", node.title, node.path);
    write!(out, "{}", title.bold())?;
    if !node.preview.is_empty() {
        write!(out, " = {}", styled_preview(node.kind, &node.preview))?;
    }
    writeln!(out)?;
    if let Some(err) = &node.error {
        writeln!(out, "  {} {err}", "!".red().bold())?;
    }
    if let Some(meta) = &node.meta {
        write_meta(out, meta)?;
    }

    for child in &node.children {
        let label = if child.disabled {
            format!("- {}", child.label).dimmed().to_string()
        } else {
            format!("+ {}", child.label)
        };
        write!(out, "  {label}")?;
        if let Some(count) = child.count {
            write!(out, " ({count})")?;
        }
        if let Some(preview) = &child.preview {
            write!(out, ": {}", styled_preview(child.kind, preview))?;
        }
        writeln!(out)?;
        if let Some(list) = node.lists.iter().find(|l| l.name == child.key) {
            write_list(out, list)?;
        }
    }
    Ok(())
}

fn write_meta(out: &mut impl Write, meta: &MetaInfo) -> anyhow::Result<()> {
    let mut line = format!("({} {})", meta.kind, meta.definition);
    if let Some(t) = &meta.data_type {
        line.push_str(&format!(" type={t}"));
    }
    if let Some(s) = &meta.shape {
        line.push_str(&format!(" shape={s}"));
    }
    if let Some(u) = &meta.unit {
        line.push_str(&format!(" unit={u}"));
    }
    writeln!(out, "  {}", line.cyan())?;
    if !meta.description.is_empty() {
        writeln!(out, "  {}", meta.description.italic())?;
    }
    Ok(())
}

fn write_list(out: &mut impl Write, list: &ListView) -> anyhow::Result<()> {
    let mut previous: Option<usize> = None;
    for item in &list.items {
        let index = item
            .rsplit_once(':')
            .and_then(|(_, i)| i.parse::<usize>().ok());
        if let (Some(prev), Some(index)) = (previous, index)
            && index > prev + 1
        {
            let more = format!("… {} more (more {} down|up)", list.hidden, list.name);
            writeln!(out, "      {}", more.yellow())?;
        }
        writeln!(out, "      {item}")?;
        previous = index;
    }
    Ok(())
}

fn styled_preview(kind: RenderKind, preview: &str) -> String {
    match kind {
        RenderKind::Unavailable => preview.red().to_string(),
        RenderKind::Reference => preview.blue().to_string(),
        RenderKind::Quantity => preview.green().to_string(),
        RenderKind::Section | RenderKind::List => preview.to_string(),
    }
}

/// One line per lane, the focused lane last.
pub fn write_lanes(out: &mut impl Write, nav: &Navigator) -> anyhow::Result<()> {
    for (i, lane) in nav.lanes().iter().enumerate() {
        let key = lane.key().unwrap_or("/");
        let selected = lane
            .selected()
            .map(|s| format!(" -> {s}"))
            .unwrap_or_default();
        writeln!(
            out,
            "{:>3} {} {}{}",
            i,
            key.bold(),
            lane.adaptor().definition().name(),
            selected.dimmed()
        )?;
    }
    Ok(())
}

pub fn write_search(out: &mut impl Write, options: &[&SearchOption]) -> anyhow::Result<()> {
    for option in options {
        writeln!(out, "{}  {}", option.label.bold(), option.target().dimmed())?;
    }
    if options.is_empty() {
        writeln!(out, "{}", "no matches".yellow())?;
    }
    Ok(())
}
