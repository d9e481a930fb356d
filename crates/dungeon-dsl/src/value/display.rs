//! Display and Debug implementations for Value

use std::fmt;

use super::*;

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Entity(id) => write!(f, "entity#{}", id.0),

            Value::String(s) => write!(f, "{:?}", s.as_ref()),
            Value::Graph(g) => write!(
                f,
                "<graph {} ({} nodes, {} edges)>",
                g.name,
                g.nodes.len(),
                g.edges.len()
            ),

            Value::Aggregate(a) => {
                write!(f, "{} {{ ", a.type_name)?;
                for (i, (k, v)) in a.members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {:?}", k, v)?;
                }
                write!(f, " }}")
            }

            Value::Prototype(p) => write!(f, "<prototype {}: {}>", p.name, p.ty),
            Value::List(l) => write_entries(f, "[", l.entries.iter(), "]"),
            Value::Set(set) => write_entries(f, "<", set.iter(), ">"),
            Value::Host(h) => write!(f, "{:?}", h),
            Value::Function(func) => write!(f, "<fn {}>", func.name),
            Value::Native(n) => write!(f, "<native {}>", n.name),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s.as_ref()), // No quotes for Display
            _ => fmt::Debug::fmt(self, f),
        }
    }
}

fn write_entries<'a>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    entries: impl Iterator<Item = &'a Value>,
    close: &str,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, entry) in entries.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{:?}", entry)?;
    }
    f.write_str(close)
}
