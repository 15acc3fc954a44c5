//! Build-step model and the formatter that renders it.

use std::fmt;

/// Separator between commands chained inside one `RUN`.
const CONTINUATION: &str = " \\\n    && ";

/// One Dockerfile instruction (or comment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStep {
    From { image: String, tag: String },
    Label { key: String, value: String },
    Shell(Vec<String>),
    Entrypoint(Vec<String>),
    Cmd(Vec<String>),
    Env { key: String, value: String },
    Arg { name: String, default: Option<String> },
    Copy { src: String, dst: String },
    /// Commands joined with `&&` into a single `RUN`.
    Run(Vec<String>),
    /// Commands appended to the preceding `RUN`, so they share its layer.
    /// Rendered as a fresh `RUN` when nothing precedes it.
    AndThen(Vec<String>),
    Comment(String),
}

/// The part of the Dockerfile a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Header,
    SetupFiles,
    CaTrust,
    Preamble,
    Packages,
    Cleanup,
    Libraries,
}

/// A group of steps rendered together, separated from its neighbours by a
/// blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub stage: Stage,
    pub steps: Vec<BuildStep>,
}

/// A complete, ordered Dockerfile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dockerfile {
    blocks: Vec<Block>,
}

impl BuildStep {
    pub fn run<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BuildStep::Run(commands.into_iter().map(Into::into).collect())
    }

    pub fn copy(src: impl Into<String>, dst: impl Into<String>) -> Self {
        BuildStep::Copy {
            src: src.into(),
            dst: dst.into(),
        }
    }

    pub fn env(key: impl Into<String>, value: impl Into<String>) -> Self {
        BuildStep::Env {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        BuildStep::Comment(text.into())
    }

    /// Shell commands carried by this step, if it runs any.
    pub fn commands(&self) -> &[String] {
        match self {
            BuildStep::Run(cmds) | BuildStep::AndThen(cmds) => cmds,
            _ => &[],
        }
    }
}

impl Block {
    pub fn new(stage: Stage, steps: Vec<BuildStep>) -> Self {
        Self { stage, steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn continues_run(&self) -> bool {
        matches!(self.steps.first(), Some(BuildStep::AndThen(_)))
    }
}

impl Dockerfile {
    /// Empty blocks are dropped.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks: blocks.into_iter().filter(|b| !b.is_empty()).collect(),
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Stage of every block, in output order.
    pub fn stages(&self) -> Vec<Stage> {
        self.blocks.iter().map(|b| b.stage).collect()
    }

    pub fn steps(&self) -> impl Iterator<Item = &BuildStep> {
        self.blocks.iter().flat_map(|b| b.steps.iter())
    }

    /// Index of the first block in `stage`.
    pub fn position(&self, stage: Stage) -> Option<usize> {
        self.blocks.iter().position(|b| b.stage == stage)
    }

    pub fn render(&self) -> String {
        render_blocks(&self.blocks)
    }
}

impl fmt::Display for Dockerfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_blocks(std::slice::from_ref(self)))
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStep::From { image, tag } => write!(f, "FROM {image}:{tag}"),
            BuildStep::Label { key, value } => write!(f, "LABEL {key}={}", quoted(value)),
            BuildStep::Shell(args) => write!(f, "SHELL {}", exec_form(args)),
            BuildStep::Entrypoint(args) => write!(f, "ENTRYPOINT {}", exec_form(args)),
            BuildStep::Cmd(args) => write!(f, "CMD {}", exec_form(args)),
            BuildStep::Env { key, value } => write!(f, "ENV {key}={value}"),
            BuildStep::Arg { name, default } => match default {
                Some(value) => write!(f, "ARG {name}={value}"),
                None => write!(f, "ARG {name}"),
            },
            BuildStep::Copy { src, dst } => write!(f, "COPY {src} {dst}"),
            BuildStep::Run(cmds) | BuildStep::AndThen(cmds) => {
                write!(f, "RUN {}", cmds.join(CONTINUATION))
            }
            BuildStep::Comment(text) => write!(f, "# {text}"),
        }
    }
}

/// Render blocks into Dockerfile text.
///
/// A block that opens with [`BuildStep::AndThen`] is glued onto the `RUN`
/// that ended the previous block instead of starting after a blank line.
pub fn render_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut open_run = false;

    for (i, block) in blocks.iter().filter(|b| !b.is_empty()).enumerate() {
        if i > 0 && !(open_run && block.continues_run()) {
            close_run(&mut out, &mut open_run);
            out.push('\n');
        }
        for step in &block.steps {
            render_step(&mut out, step, &mut open_run);
        }
    }
    close_run(&mut out, &mut open_run);
    out
}

fn render_step(out: &mut String, step: &BuildStep, open_run: &mut bool) {
    match step {
        BuildStep::AndThen(cmds) if *open_run => {
            for cmd in cmds {
                out.push_str(CONTINUATION);
                out.push_str(cmd);
            }
        }
        BuildStep::Run(cmds) | BuildStep::AndThen(cmds) if cmds.is_empty() => {}
        BuildStep::Run(_) | BuildStep::AndThen(_) => {
            close_run(out, open_run);
            out.push_str(&step.to_string());
            *open_run = true;
        }
        _ => {
            close_run(out, open_run);
            out.push_str(&step.to_string());
            out.push('\n');
        }
    }
}

fn close_run(out: &mut String, open_run: &mut bool) {
    if *open_run {
        out.push('\n');
        *open_run = false;
    }
}

fn quoted(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn exec_form(args: &[String]) -> String {
    let items: Vec<String> = args.iter().map(|a| quoted(a)).collect();
    format!("[{}]", items.join(", "))
}
