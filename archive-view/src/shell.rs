//! Interactive browsing.
//!
//! Reads one command per line and prints the focused lane after every
//! successful transition. A rejected transition prints a warning and leaves
//! the lanes as they were.

use std::{
    io::{BufRead, Write},
    str::FromStr,
};

use colored::Colorize;
use metainfo_browser::{Navigator, ViewFlags, pager::Direction, search};

use crate::{ctx::ViewContext, output};

const HELP: &str = "\
cd KEY              open a child of the focused lane (`run:0`, `energy`)
sel LANE KEY        open a child of an earlier lane
up                  close the focused lane
back LANE           close every lane after LANE
top                 back to the root
go PATH             open a whole path (`run:0/system:1`)
more LIST [down|up] show more elements of a long list
toggle code|all|meta
find QUERY          search the archive
lanes               print the lanes
show                print the focused lane
help
quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    CodeSpecific,
    AllDefined,
    Meta,
}

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Cd(String),
    Select(usize, String),
    Up,
    Back(usize),
    Top,
    Go(String),
    More(String, Direction),
    Toggle(Toggle),
    Find(String),
    Lanes,
    Show,
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            return Ok(ShellCommand::Show);
        };
        let rest: Vec<&str> = words.collect();
        let arg = |i: usize| argument(&rest, i, cmd);
        let command = match cmd {
            "cd" => ShellCommand::Cd(arg(0)?.to_string()),
            "sel" => ShellCommand::Select(arg(0)?.parse()?, arg(1)?.to_string()),
            "up" | ".." => ShellCommand::Up,
            "back" => ShellCommand::Back(arg(0)?.parse()?),
            "top" => ShellCommand::Top,
            "go" => ShellCommand::Go(arg(0)?.to_string()),
            "more" => {
                let direction = match rest.get(1) {
                    Some(d) => d.parse().map_err(|e: String| anyhow!(e))?,
                    None => Direction::Down,
                };
                ShellCommand::More(arg(0)?.to_string(), direction)
            }
            "toggle" => ShellCommand::Toggle(match arg(0)? {
                "code" => Toggle::CodeSpecific,
                "all" => Toggle::AllDefined,
                "meta" => Toggle::Meta,
                other => bail!("unknown toggle `{other}`, expected code, all or meta"),
            }),
            "find" => ShellCommand::Find(rest.join(" ")),
            "lanes" => ShellCommand::Lanes,
            "show" | "ls" => ShellCommand::Show,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => bail!("unknown command `{other}`, see `help`"),
        };
        Ok(command)
    }
}

fn argument<'l>(rest: &[&'l str], i: usize, cmd: &str) -> anyhow::Result<&'l str> {
    rest.get(i)
        .copied()
        .ok_or_else(|| anyhow!("`{cmd}` needs an argument, see `help`"))
}

/// An interactive session: its own lanes and display flags over a shared
/// context.
pub struct Shell<'a> {
    ctx: &'a ViewContext,
    nav: Navigator,
    flags: ViewFlags,
    index: Option<Vec<search::SearchOption>>,
}

impl<'a> Shell<'a> {
    pub fn new(ctx: &'a ViewContext) -> Self {
        Self {
            ctx,
            nav: ctx.navigator(),
            flags: ctx.flags(),
            index: None,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn flags(&self) -> ViewFlags {
        self.flags
    }

    /// Run one command. Returns `false` once the shell should exit.
    pub async fn execute(&mut self, command: ShellCommand, out: &mut impl Write) -> anyhow::Result<bool> {
        match command {
            ShellCommand::Cd(key) => {
                self.nav.push(&key)?;
                self.show(out)?;
            }
            ShellCommand::Select(lane, key) => {
                self.nav.select(lane, &key)?;
                self.show(out)?;
            }
            ShellCommand::Up => {
                if self.nav.pop().is_none() {
                    writeln!(out, "{}", "already at the root".yellow())?;
                }
                self.show(out)?;
            }
            ShellCommand::Back(lane) => {
                self.nav.truncate_to(lane)?;
                self.show(out)?;
            }
            ShellCommand::Top => {
                self.nav.reset();
                self.show(out)?;
            }
            ShellCommand::Go(path) => {
                self.nav.navigate(&path)?;
                self.show(out)?;
            }
            ShellCommand::More(list, direction) => {
                let lane = self.nav.len() - 1;
                self.ctx.expand(&mut self.nav, lane, &list, direction).await?;
                self.show(out)?;
            }
            ShellCommand::Toggle(toggle) => {
                let flag = match toggle {
                    Toggle::CodeSpecific => &mut self.flags.show_code_specific,
                    Toggle::AllDefined => &mut self.flags.show_all_defined,
                    Toggle::Meta => &mut self.flags.show_meta,
                };
                *flag = !*flag;
                self.show(out)?;
            }
            ShellCommand::Find(query) => {
                let index = self.index.get_or_insert_with(|| self.ctx.search_index());
                output::write_search(out, &search::filter(index, &query))?;
            }
            ShellCommand::Lanes => output::write_lanes(out, &self.nav)?,
            ShellCommand::Show => self.show(out)?,
            ShellCommand::Help => writeln!(out, "{HELP}")?,
            ShellCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn show(&self, out: &mut impl Write) -> anyhow::Result<()> {
        let node = self.nav.render(&self.flags, &self.ctx.units);
        output::write_node(out, &node)
    }

    /// Read commands until end of input or `quit`.
    pub async fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> anyhow::Result<()> {
        self.show(out)?;
        write!(out, "{}> ", self.nav.path())?;
        out.flush()?;
        for line in input.lines() {
            let line = line?;
            let keep_going = match line.parse::<ShellCommand>() {
                Ok(command) => match self.execute(command, out).await {
                    Ok(keep_going) => keep_going,
                    Err(err) => {
                        writeln!(out, "{} {err}", "!".yellow().bold())?;
                        true
                    }
                },
                Err(err) => {
                    writeln!(out, "{} {err}", "!".yellow().bold())?;
                    true
                }
            };
            if !keep_going {
                break;
            }
            write!(out, "{}> ", self.nav.path())?;
            out.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metainfo_browser::{
        SchemaRegistry, config::BrowserConfig, source::InMemorySource,
    };
    use serde_json::json;
    use std::sync::Arc;

    async fn context() -> ViewContext {
        let registry = SchemaRegistry::from_json(&json!({
            "root": "Archive",
            "sections": [
                {"name": "Archive", "sub_sections": [{"name": "run", "section": "Run", "repeats": true}]},
                {"name": "Run", "quantities": [
                    {"name": "program", "type": "str"},
                    {"name": "x_code_flag", "type": "bool"}
                ], "sub_sections": [{"name": "step", "section": "Step", "repeats": true}]},
                {"name": "Step", "quantities": [{"name": "n", "type": "int"}]}
            ]
        }))
        .unwrap();
        let steps: Vec<_> = (0..40).map(|n| json!({"n": n})).collect();
        let source = InMemorySource::new(json!({
            "run": [{"program": "VASP", "x_code_flag": true, "step": steps}]
        }));
        ViewContext::new(BrowserConfig::default(), Arc::new(registry), Arc::new(source))
            .await
            .unwrap()
    }

    fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("cd run:0".parse::<ShellCommand>().unwrap(), ShellCommand::Cd("run:0".into()));
        assert_eq!(
            "more step up".parse::<ShellCommand>().unwrap(),
            ShellCommand::More("step".into(), Direction::Up)
        );
        assert_eq!(
            "sel 1 step:3".parse::<ShellCommand>().unwrap(),
            ShellCommand::Select(1, "step:3".into())
        );
        assert_eq!("".parse::<ShellCommand>().unwrap(), ShellCommand::Show);
        assert!("cd".parse::<ShellCommand>().is_err());
        assert!("toggle colors".parse::<ShellCommand>().is_err());
        assert!("more step sideways".parse::<ShellCommand>().is_err());
        assert!("jump".parse::<ShellCommand>().is_err());
    }

    #[tokio::test]
    async fn test_rejected_command_keeps_lanes() {
        colored::control::set_override(false);
        let ctx = context().await;
        let mut shell = Shell::new(&ctx);
        let mut out = Vec::new();
        shell
            .execute(ShellCommand::Go("run:0".into()), &mut out)
            .await
            .unwrap();
        assert!(
            shell
                .execute(ShellCommand::Cd("nonexistent".into()), &mut out)
                .await
                .is_err()
        );
        assert_eq!(shell.navigator().path(), "run:0");
    }

    #[tokio::test]
    async fn test_session() {
        colored::control::set_override(false);
        let ctx = context().await;
        let mut shell = Shell::new(&ctx);
        let input = "cd run:0\nmore step\ntoggle code\ncd nope\nfind prog\nquit\ncd run:0\n";
        let mut out = Vec::new();
        shell.run(input.as_bytes(), &mut out).await.unwrap();
        let out = text(out);

        assert!(out.contains("+ program: VASP"));
        assert!(out.contains("step:19"));
        assert!(out.contains("x_code_flag: true"));
        assert!(out.contains("! section `Run` has no property `nope`"));
        assert!(out.contains("program  run:0/program"));
        assert!(shell.flags().show_code_specific);
        assert_eq!(shell.navigator().path(), "run:0");
    }
}
