use astguard_syntax::{Node, render_list};

use super::binding::{Binding, CaptureEnv};
use super::trace::CaptureTrace;
use crate::ir::template::{Segment, Template};

/// Type name shown for a capture whose type is not known.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Fill in a message template. `$$` becomes the canonical text of the whole
/// match (statements of a sequence are joined with `; `), `$name` the text of
/// the capture.
pub fn render_message(template: &Template, whole: &[Node], env: &CaptureEnv<'_>) -> String {
    let mut out = String::new();
    for segment in template.segments() {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::WholeMatch => {
                let nodes: Vec<&Node> = whole.iter().collect();
                out.push_str(&render_list(&nodes, "; "));
            }
            Segment::Capture(name) => match env.get(name) {
                Some(binding) => out.push_str(&binding.text()),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            },
        }
    }
    out
}

/// Render one capture for a debug trace: its type and its text.
pub fn render_capture(name: &str, binding: &Binding<'_>) -> CaptureTrace {
    let ty = if binding.is_multi() {
        format!("[{}]", binding.nodes().len())
    } else {
        binding
            .ty
            .map_or_else(|| UNKNOWN_TYPE.to_owned(), ToString::to_string)
    };
    CaptureTrace {
        name: name.to_owned(),
        ty,
        text: binding.text(),
    }
}
