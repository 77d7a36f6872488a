//! Static rendering of the interactive `<Quiz>` component.

use super::literal;
use anyhow::{anyhow, Context, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

static RE_QUIZ: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<Quiz\s+questions=\{(.*?)\}\s*/>").expect("valid quiz regex")
});

const QUIZ_HEADING: &str = "## 自测 Quiz（Word 版）";
const QUIZ_PLACEHOLDER: &str = "（交互题已转换为静态文档，未保留点击交互。）";

/// JavaScript truthiness.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// JavaScript `String(value)`.
fn js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                item => js_string(item),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// `String(value || "")`, with a missing field read as `undefined`.
fn field_text(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(value) if truthy(value) => js_string(value),
        _ => String::new(),
    }
}

struct QuizOption {
    label: String,
    correct: bool,
}

struct QuizQuestion {
    question: String,
    options: Vec<QuizOption>,
    explanation: Option<String>,
}

impl QuizQuestion {
    /// Read one entry leniently: fields of the wrong type are coerced the
    /// way the site's own rendering coerces them.
    fn from_value(item: &Value) -> QuizQuestion {
        let options = match item.get("options") {
            Some(Value::Array(options)) => options
                .iter()
                .map(|option| QuizOption {
                    label: field_text(option, "label"),
                    correct: option.get("correct").is_some_and(truthy),
                })
                .collect(),
            _ => Vec::new(),
        };
        QuizQuestion {
            question: field_text(item, "question"),
            options,
            explanation: item
                .get("explanation")
                .filter(|e| truthy(e))
                .map(js_string),
        }
    }
}

fn parse_questions(expression: &str) -> Result<Vec<QuizQuestion>> {
    let value = literal::parse(expression.trim()).with_context(|| "Failed to read quiz literal")?;
    match value {
        Value::Array(items) => Ok(items.iter().map(QuizQuestion::from_value).collect()),
        other => Err(anyhow!("Quiz literal is not a list of questions: {other}")),
    }
}

/// `A`, `B`, ..., `Z`, `AA`, `AB`, ...
fn option_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

fn format_quiz(questions: &[QuizQuestion]) -> String {
    let mut lines = vec![QUIZ_HEADING.to_string(), String::new()];
    for (i, q) in questions.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, q.question.trim()));
        for (j, option) in q.options.iter().enumerate() {
            let marker = if option.correct { "（正确）" } else { "" };
            lines.push(format!("   - {}. {}{marker}", option_letter(j), option.label.trim()));
        }
        if let Some(explanation) = q.explanation.as_deref() {
            lines.push(format!("   - 解析：{}", explanation.trim()));
        }
        lines.push(String::new());
    }
    format!("\n{}\n", lines.join("\n"))
}

/// Replace `<Quiz questions={[...]} />` with a numbered question list.
///
/// The correct option is marked and the explanation follows the options.
/// When the expression cannot be read as quiz data a short note stands in
/// for the quiz instead.
pub fn convert_quiz(input: &str) -> String {
    RE_QUIZ
        .replace_all(input, |caps: &Captures| match parse_questions(&caps[1]) {
            Ok(questions) => format_quiz(&questions),
            Err(e) => {
                log::debug!("Quiz kept as placeholder: {e:#}");
                format!("\n{QUIZ_HEADING}\n\n{QUIZ_PLACEHOLDER}\n")
            }
        })
        .into_owned()
}
