//! Text blocks shown in the status and inspect panels

use dockwatch_provider::{InspectSummary, PortMapping};

/// Width of the inspect labels; continuation lines are indented by it
const LABEL_WIDTH: usize = 12;

/// Three-line installation progress block
pub fn render_status(text: &str, download: f64, extract: f64) -> String {
    format!(
        "Installation state: {}\nImage download:     {:.1}%\nImage extraction:   {:.1}%",
        text, download, extract
    )
}

/// Bound ports as `"port/proto:hostport/proto"`, sorted as strings
pub fn sorted_port_labels(summary: &InspectSummary) -> Vec<String> {
    let mut ports: Vec<String> = summary
        .ports
        .iter()
        .filter_map(PortMapping::binding_label)
        .collect();
    ports.sort();
    ports
}

/// Container state and network metadata, one field per line
pub fn render_inspect(summary: &InspectSummary) -> String {
    let continuation = format!("\n{}", " ".repeat(LABEL_WIDTH));
    let ports = sorted_port_labels(summary).join(&continuation);

    let mut out = String::new();
    out.push_str(&format!("{:<w$}{}\n", "Container:", summary.state, w = LABEL_WIDTH));
    out.push_str(&format!("{:<w$}{}\n", "Ports:", ports, w = LABEL_WIDTH));
    out.push_str(&format!("{:<w$}{}\n", "Gateway:", summary.gateway, w = LABEL_WIDTH));
    out.push_str(&format!("{:<w$}{}\n", "IPAddress:", summary.ip_address, w = LABEL_WIDTH));
    out.push_str(&format!("{:<w$}{}\n", "MacAddress:", summary.mac_address, w = LABEL_WIDTH));
    out
}
