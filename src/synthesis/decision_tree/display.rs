use std::fmt::{Display, Formatter};

use colored::Colorize;

use crate::synthesis::decision_tree::explanation::{Explanation, Literal};

pub struct ExplanationDisplay<'a> {
    pub(crate) explanation: &'a Explanation,
}

impl Display for ExplanationDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, literal) in self.explanation.literals().iter().enumerate() {
            let text = literal.to_term().to_string();
            let token = match literal {
                _ if literal.is_separation() => text.red(),
                Literal::Guard(_) => text.yellow(),
                Literal::Condition { .. } => text.cyan(),
                _ => text.normal(),
            };
            if i > 0 {
                write!(f, ", {token}")?;
            } else {
                write!(f, "{token}")?;
            }
        }
        write!(f, "]")
    }
}
