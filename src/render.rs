//! Mind-map presentation.
//!
//! Two views of the same [`MindmapNode`] tree:
//!
//! - [`outline`]: an indented box-drawing tree for terminals.
//! - [`html_page`]: a self-contained HTML page that draws the tree with
//!   D3 v7 (horizontal layout, zoom and pan). The tree is embedded as JSON in
//!   exactly the `{ "name", "children" }` shape the script reads.

use crate::error::DocuMindError;
use crate::pipeline::mindmap::MindmapNode;

/// Render the tree as an indented outline.
///
/// ```text
/// Root
/// ├── Branch
/// │   └── Leaf
/// └── Other
/// ```
pub fn outline(root: &MindmapNode) -> String {
    let mut out = String::new();
    out.push_str(&root.name);
    out.push('\n');
    write_children(&mut out, &root.children, "");
    out
}

fn write_children(out: &mut String, children: &[MindmapNode], prefix: &str) {
    let last = children.len().saturating_sub(1);
    for (i, child) in children.iter().enumerate() {
        let (branch, indent) = if i == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(&child.name);
        out.push('\n');
        write_children(out, &child.children, &format!("{prefix}{indent}"));
    }
}

/// Render the tree as a standalone interactive HTML page.
pub fn html_page(root: &MindmapNode) -> Result<String, DocuMindError> {
    let data = serde_json::to_string(root)
        .map_err(|e| DocuMindError::Internal(format!("mind map serialisation failed: {e}")))?;
    // Keep a label like "</script>" from closing the script element.
    let data = data.replace("</", "<\\/");

    let (head, tail) = HTML_TEMPLATE
        .split_once("{{DATA}}")
        .ok_or_else(|| DocuMindError::Internal("mind map template has no data slot".into()))?;
    Ok(format!(
        "{}{}{}",
        head.replace("{{TITLE}}", &escape_html(&root.name)),
        data,
        tail
    ))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const HTML_TEMPLATE: &str = r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{TITLE}} · mind map</title>
<script src="https://d3js.org/d3.v7.min.js"></script>
<style>
  body { margin: 0; overflow: hidden; }
  svg { background: #ffffff; width: 100vw; height: 100vh; }
  .node rect {
    stroke: #fff;
    stroke-width: 2px;
    cursor: pointer;
    filter: drop-shadow(0 3px 3px rgba(0,0,0,0.1));
  }
  .node:hover rect { filter: drop-shadow(0 5px 8px rgba(0,0,0,0.2)); }
  .node text {
    font-family: 'Inter', sans-serif;
    font-size: 12px;
    font-weight: 500;
    fill: #333;
    pointer-events: none;
    dominant-baseline: middle;
  }
  .link { fill: none; stroke: #cbd5e1; stroke-width: 1.5px; }
</style>
</head>
<body>
<svg id="mindmap"></svg>
<script>
const data = {{DATA}};

const ROOT_FILL = "#e0e7ff";
const DEPTH_FILLS = ["#e0f2fe", "#f0fdf4", "#fef3c7", "#fce7f3", "#ede9fe"];
const ROW_HEIGHT = 60;
const BOX_HEIGHT = 36;

const root = d3.hierarchy(data);
const width = window.innerWidth;
const height = Math.max(600, root.leaves().length * ROW_HEIGHT);

const svg = d3.select("#mindmap").attr("width", width).attr("height", height);
const g = svg.append("g");

const zoom = d3.zoom()
  .scaleExtent([0.1, 4])
  .on("zoom", (event) => g.attr("transform", event.transform));
svg.call(zoom);

d3.tree().size([height - 100, width - 400])(root);

g.selectAll(".link")
  .data(root.links())
  .join("path")
  .attr("class", "link")
  .attr("d", d3.linkHorizontal().x(d => d.y).y(d => d.x));

const node = g.selectAll(".node")
  .data(root.descendants())
  .join("g")
  .attr("class", "node")
  .attr("transform", d => `translate(${d.y},${d.x})`);

node.append("rect")
  .attr("rx", 6)
  .attr("ry", 6)
  .attr("width", d => Math.max(120, d.data.name.length * 8))
  .attr("height", BOX_HEIGHT)
  .attr("y", -BOX_HEIGHT / 2)
  .attr("fill", d => d.depth === 0 ? ROOT_FILL : DEPTH_FILLS[d.depth % DEPTH_FILLS.length]);

node.append("text")
  .attr("x", 10)
  .attr("dy", 1)
  .text(d => d.data.name);

const scale = 0.8;
const box = g.node().getBBox();
svg.call(zoom.transform, d3.zoomIdentity
  .translate(50, (height - box.height * scale) / 2 - box.y * scale)
  .scale(scale));
</script>
</body>
</html>
"##;
