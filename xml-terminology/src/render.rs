//! Render terminologies to graphviz `.dot` files.
//!
//! Generally, use `terminology.render_to(filename, RenderSettings::default())`.

use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;

use crate::term::{TermId, TermNode};
use crate::Terminology;

/// Settings related to rendering terminologies.
pub struct RenderSettings {
    /// Whether to display the absolute xpath next to every term.
    pub show_xpaths: bool,
    /// The title which should be displayed above the graph.
    ///
    /// Defaults to the filename given to [`Terminology::render_to`].
    pub title: Option<String>,
}

impl RenderSettings {
    /// Sets the name of the terminology
    pub fn with_name(mut self, name: impl AsRef<str>) -> Self {
        self.title = Some(name.as_ref().to_string());
        self
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            show_xpaths: true,
            title: None,
        }
    }
}

fn node_name(id: TermId) -> String {
    format!("term_{id}")
}

fn escape_text(inp: &str) -> String {
    inp.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Terminology {
    /// Visualize the terminology as a tree, by emitting a graphviz dot file.
    ///
    /// Proxies are drawn dashed, with a dashed edge to the term they forward to.
    pub fn render<W: Write>(&self, output: &mut W, settings: RenderSettings) -> io::Result<()> {
        writeln!(output, "digraph {{")?;
        writeln!(
            output,
            r#"node [colorscheme="ylgnbu6",fontname="monospace",xlp="b"]"#
        )?;

        if let Some(ref title) = settings.title {
            writeln!(output, r#"labelloc="t";"#)?;
            writeln!(output, r#"label="{}";"#, escape_text(title))?;
        }

        let order = self.walk();

        // nodes
        for &id in &order {
            let Some(node) = self.node(id) else { continue };
            let mut attrs = vec![format!(r#"[label="{}"]"#, escape_text(node.name().as_str()))];
            match node {
                TermNode::Term(term) => {
                    attrs.push(r#"[shape="box"]"#.to_string());
                    if term.is_root_term() {
                        attrs.push(r#"[penwidth="2.0"]"#.to_string());
                    }
                    if settings.show_xpaths {
                        attrs.push(format!(
                            r#"[xlabel="{}"]"#,
                            escape_text(term.xpath_absolute())
                        ));
                    }
                }
                TermNode::Proxy(_) => attrs.push(r#"[shape="box"][style="dashed"]"#.to_string()),
            }
            writeln!(output, "{} {}", node_name(id), attrs.join(""))?;
        }

        // edges
        for &id in &order {
            let Some(node) = self.node(id) else { continue };
            if let Some(parent) = node.parent_id() {
                writeln!(output, "{} -> {}", node_name(parent), node_name(id))?;
            }
            if let TermNode::Proxy(_) = node {
                if let Ok(target) = self.resolve_proxy(id) {
                    writeln!(
                        output,
                        r#"{} -> {} [style="dashed"]"#,
                        node_name(id),
                        node_name(target.id())
                    )?;
                }
            }
        }

        writeln!(output, "}}")?;

        Ok(())
    }

    /// [`render`](Terminology::render) directly to a file.
    pub fn render_to(&self, path: impl AsRef<Path>, mut settings: RenderSettings) -> io::Result<()> {
        let path = path.as_ref();
        let mut w = File::create(path)?;

        if settings.title.is_none() {
            settings.title = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string());
        }

        self.render(&mut w, settings)
    }
}
