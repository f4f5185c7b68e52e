//! Render a pattern tree as Strudel code.
//!
//! Effect-free subtrees render as mini-notation inside `s("...")`.
//! Subtrees that contain an effect render with pattern functions and
//! method chains, since mini-notation cannot carry effects.

use super::ast::{Node, NodeKind};

/// `setcps(<bpm>/60/4)`, one cycle per four beats.
pub fn tempo_header(bpm: f64) -> String {
    format!("setcps({}/60/4)", fmt_num(bpm))
}

/// Full program: tempo header line followed by the pattern expression.
pub fn render_program(tree: &Node, bpm: f64) -> String {
    format!("{}\n{}", tempo_header(bpm), render(tree))
}

/// Render the pattern expression. A root stack puts one layer per line.
pub fn render(tree: &Node) -> String {
    match &tree.kind {
        NodeKind::Stack(children) if !children.is_empty() => {
            let layers: Vec<String> = children.iter().map(|c| format!("  {}", expr(c))).collect();
            format!("stack(\n{}\n)", layers.join(",\n"))
        }
        _ => expr(tree),
    }
}

fn expr(node: &Node) -> String {
    if !node.contains_effect() {
        return match &node.kind {
            NodeKind::Rest => "silence".to_string(),
            NodeKind::Stack(children) if children.is_empty() => "silence".to_string(),
            NodeKind::Sequence(children) if children.is_empty() => "silence".to_string(),
            _ => format!("s(\"{}\")", mini(node, true)),
        };
    }

    match &node.kind {
        NodeKind::Effect { child, effect, amount } => {
            format!("{}.{}({})", expr(child), effect, fmt_num(*amount))
        }
        NodeKind::Sequence(children) => format!("seq({})", join_exprs(children)),
        NodeKind::Stack(children) => format!("stack({})", join_exprs(children)),
        NodeKind::Repeat { child, times } => format!("{}.fast({})", expr(child), times),
        NodeKind::Euclidean { child, pulses, steps, rotation } => {
            format!("{}.euclidRot({}, {}, {})", expr(child), pulses, steps, rotation)
        }
        // Leaves never contain effects.
        NodeKind::Sound { .. } | NodeKind::Rest => format!("s(\"{}\")", mini(node, true)),
    }
}

fn join_exprs(children: &[std::sync::Arc<Node>]) -> String {
    children.iter().map(|c| expr(c)).collect::<Vec<_>>().join(", ")
}

/// Mini-notation for an effect-free subtree. `top` drops the brackets
/// around a root sequence.
fn mini(node: &Node, top: bool) -> String {
    match &node.kind {
        NodeKind::Sound { sample } => sample.clone(),
        NodeKind::Rest => "~".to_string(),
        NodeKind::Sequence(children) => {
            if children.is_empty() {
                return "~".to_string();
            }
            let inner: Vec<String> = children.iter().map(|c| mini(c, false)).collect();
            if top {
                inner.join(" ")
            } else {
                format!("[{}]", inner.join(" "))
            }
        }
        NodeKind::Stack(children) => {
            if children.is_empty() {
                return "~".to_string();
            }
            let inner: Vec<String> = children.iter().map(|c| mini(c, false)).collect();
            format!("[{}]", inner.join(", "))
        }
        NodeKind::Repeat { child, times } => format!("{}*{}", mini(child, false), times),
        NodeKind::Euclidean { child, pulses, steps, rotation } => {
            if *rotation == 0 {
                format!("{}({},{})", mini(child, false), pulses, steps)
            } else {
                format!("{}({},{},{})", mini(child, false), pulses, steps, rotation)
            }
        }
        NodeKind::Effect { child, .. } => mini(child, top),
    }
}

/// Integers print without a fraction; everything else uses the shortest
/// round-trip form.
pub fn fmt_num(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::ast::NodeIdAllocator;

    #[test]
    fn mini_notation_for_plain_layers() {
        let mut a = NodeIdAllocator::new();
        let bd = a.sound("bd");
        let r = a.rest();
        let hh1 = a.sound("hh");
        let hh2 = a.sound("hh");
        let sub = a.sequence(vec![hh1, hh2]);
        let seq = a.sequence(vec![bd, r, sub]);
        assert_eq!(render(&seq), "s(\"bd ~ [hh hh]\")");
    }

    #[test]
    fn repeat_and_euclid() {
        let mut a = NodeIdAllocator::new();
        let bd = a.sound("bd");
        let rep = a.repeat(bd, 2);
        let sd = a.sound("sd");
        let eu = a.euclidean(sd, 3, 8, 0);
        let cp = a.sound("cp");
        let eu_rot = a.euclidean(cp, 5, 8, 2);
        let seq = a.sequence(vec![rep, eu, eu_rot]);
        assert_eq!(render(&seq), "s(\"bd*2 sd(3,8) cp(5,8,2)\")");
    }

    #[test]
    fn root_stack_renders_one_layer_per_line() {
        let mut a = NodeIdAllocator::new();
        let bd = a.sound("bd");
        let hh = a.sound("hh");
        let wet = a.effect(hh, "room", 0.4);
        let stack = a.stack(vec![bd, wet]);
        assert_eq!(
            render_program(&stack, 120.0),
            "setcps(120/60/4)\nstack(\n  s(\"bd\"),\n  s(\"hh\").room(0.4)\n)"
        );
    }

    #[test]
    fn effects_inside_sequences_use_functions() {
        let mut a = NodeIdAllocator::new();
        let bd = a.sound("bd");
        let wet = a.effect(bd, "lpf", 800.0);
        let r = a.rest();
        let seq = a.sequence(vec![wet, r]);
        let fast = a.repeat(seq, 2);
        assert_eq!(render(&fast), "seq(s(\"bd\").lpf(800), silence).fast(2)");
    }

    #[test]
    fn nested_stack_in_mini() {
        let mut a = NodeIdAllocator::new();
        let bd = a.sound("bd");
        let hh = a.sound("hh");
        let inner = a.stack(vec![bd, hh]);
        let sd = a.sound("sd");
        let seq = a.sequence(vec![inner, sd]);
        assert_eq!(render(&seq), "s(\"[bd, hh] sd\")");
    }

    #[test]
    fn number_formatting() {
        assert_eq!(fmt_num(120.0), "120");
        assert_eq!(fmt_num(0.25), "0.25");
        assert_eq!(fmt_num(137.5), "137.5");
    }
}
