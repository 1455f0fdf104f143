use crate::config::ReportFormat;
use crate::core::Diagnostic;
use crate::graph::DependencyGraph;
use crate::report::AnalysisResult;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeSet;
use std::io::Write;

pub trait ReportWriter {
    fn write_report(&mut self, result: &AnalysisResult) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ReportWriter for JsonWriter<W> {
    fn write_report(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(result)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

/// Line-oriented report: header, cycles, layers, then findings.
///
/// Contains no timestamps or absolute paths beyond the root as given, so
/// two runs over an unchanged tree produce identical bytes.
pub struct TextWriter<W: Write> {
    writer: W,
    breakdown: bool,
}

impl<W: Write> TextWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            breakdown: false,
        }
    }

    pub fn with_breakdown(mut self, breakdown: bool) -> Self {
        self.breakdown = breakdown;
        self
    }
}

impl<W: Write> ReportWriter for TextWriter<W> {
    fn write_report(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        self.write_header(result)?;
        self.write_cycles(result)?;
        self.write_layers(result)?;
        if self.breakdown {
            self.write_breakdown(result)?;
        }
        self.write_diagnostics("Warnings", &result.warnings)?;
        self.write_diagnostics("Diagnostics", &result.diagnostics)?;
        Ok(())
    }
}

impl<W: Write> TextWriter<W> {
    fn write_header(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        writeln!(self.writer, "Dependency analysis of {}", result.root.display())?;
        writeln!(self.writer, "Summary: {}", result.summary)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_cycles(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        if result.cycles.is_empty() {
            writeln!(self.writer, "Cycles: none")?;
        } else {
            writeln!(self.writer, "Cycles ({}):", result.cycle_count)?;
            for (i, cycle) in result.cycles.iter().enumerate() {
                writeln!(self.writer, "  {}. {}", i + 1, cycle)?;
            }
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_layers(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        writeln!(self.writer, "Layers ({}):", result.layers.len())?;
        for (index, layer) in result.layers.iter().enumerate() {
            writeln!(self.writer, "  Layer {}: {}", index, layer.join(", "))?;
        }
        if !result.unlayerable.is_empty() {
            writeln!(self.writer, "Unlayerable: {}", result.unlayerable.join(", "))?;
        }
        if let Some(error) = &result.layer_error {
            writeln!(self.writer, "Layering error: {}", error)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_breakdown(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        writeln!(self.writer, "Modules ({}):", result.modules.len())?;
        for module in &result.modules {
            let layer = module
                .layer
                .map_or_else(|| "unlayered".to_string(), |l| format!("layer {}", l));
            writeln!(
                self.writer,
                "  {} ({}) [{}]",
                module.name,
                module.path.display(),
                layer
            )?;
            writeln!(self.writer, "    resolved: {}", list_or_none(&module.resolved))?;
            writeln!(self.writer, "    unresolved: {}", list_or_none(&module.unresolved))?;
            if module.self_import {
                writeln!(self.writer, "    imports itself")?;
            }
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_diagnostics(&mut self, title: &str, items: &[Diagnostic]) -> anyhow::Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "{} ({}):", title, items.len())?;
        for item in items {
            writeln!(self.writer, "  {}", item)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

/// Graphviz output of the resolved import graph; cycle members are red.
pub struct DotWriter<W: Write> {
    writer: W,
}

impl<W: Write> DotWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ReportWriter for DotWriter<W> {
    fn write_report(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        let graph = DependencyGraph::from_edges(
            result.modules.iter().map(|m| m.name.as_str()),
            result.modules.iter().flat_map(|m| {
                let name = m.name.as_str();
                m.resolved
                    .iter()
                    .map(move |dep| (name, dep.as_str()))
                    .chain(m.self_import.then_some((name, name)))
            }),
        );
        let (petgraph, _) = graph.to_petgraph();
        let labelled = petgraph.map(|_, name| name.clone(), |_, _| "");
        let in_cycle: BTreeSet<&str> = result.unlayerable.iter().map(String::as_str).collect();

        let edge_attributes = |_: &DiGraph<String, &str>, _| String::new();
        let node_attributes = |_: &DiGraph<String, &str>, (_, name): (NodeIndex, &String)| {
            if in_cycle.contains(name.as_str()) {
                "color = red".to_string()
            } else {
                String::new()
            }
        };

        let dot = Dot::with_attr_getters(
            &labelled,
            &[Config::EdgeNoLabel],
            &edge_attributes,
            &node_attributes,
        );
        writeln!(self.writer, "{}", dot)?;
        Ok(())
    }
}

pub fn create_writer<'a, W: Write + 'a>(
    format: ReportFormat,
    writer: W,
    breakdown: bool,
) -> Box<dyn ReportWriter + 'a> {
    match format {
        ReportFormat::Text => Box::new(TextWriter::new(writer).with_breakdown(breakdown)),
        ReportFormat::Structured => Box::new(JsonWriter::new(writer)),
        ReportFormat::Dot => Box::new(DotWriter::new(writer)),
    }
}

/// Render `result` into a string in the given format.
pub fn render(
    result: &AnalysisResult,
    format: ReportFormat,
    breakdown: bool,
) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    create_writer(format, &mut buffer, breakdown).write_report(result)?;
    Ok(String::from_utf8(buffer)?)
}
