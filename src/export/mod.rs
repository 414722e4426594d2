use regex::Regex;

/// LaTeX commands replaced with their Unicode glyphs when preparing text
/// for word-processor export.
const SYMBOL_MAP: &[(&str, &str)] = &[
    ("\\psi", "ψ"),
    ("\\phi", "ϕ"),
    ("\\theta", "θ"),
    ("\\pi", "π"),
    ("\\alpha", "α"),
    ("\\beta", "β"),
    ("\\gamma", "γ"),
    ("\\delta", "δ"),
    ("\\epsilon", "ε"),
    ("\\hbar", "ħ"),
    ("\\infty", "∞"),
    ("\\sqrt", "√"),
    ("\\int", "∫"),
    ("\\sum", "∑"),
    ("\\partial", "∂"),
    ("\\nabla", "∇"),
    ("\\Delta", "Δ"),
    ("\\approx", "≈"),
    ("\\neq", "≠"),
    ("\\le", "≤"),
    ("\\ge", "≥"),
    ("\\times", "×"),
    ("\\cdot", "·"),
    ("\\rightarrow", "→"),
    ("\\Rightarrow", "⇒"),
    ("\\dots", "..."),
];

/// Strip LaTeX math delimiters and map common commands to Unicode so the
/// text reads naturally in a word processor.
pub fn clean_math(text: &str) -> String {
    let mut cleaned = text.to_string();

    // \[ ... \] and \( ... \) wrappers keep their inner text
    for re in [r"\\\[(.*?)\\\]", r"\\\((.*?)\\\)", r"\\text\{(.*?)\}"] {
        if let Ok(pattern) = Regex::new(re) {
            cleaned = pattern.replace_all(&cleaned, "$1").into_owned();
        }
    }

    for (latex, unicode) in SYMBOL_MAP {
        cleaned = cleaned.replace(latex, unicode);
    }

    cleaned.replace("\\{", "{").replace("\\}", "}")
}

/// Render markdown-flavored summary content as word-processor-ready text:
/// headings become underlined lines, bold markers are dropped, and math is
/// cleaned via [`clean_math`]. Pure string templating, no side effects.
pub fn render_document(content: &str) -> String {
    let mut blocks = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let block = if let Some(title) = line.strip_prefix("# ") {
            underline(&clean_math(title), '=')
        } else if let Some(title) = line.strip_prefix("## ") {
            underline(&clean_math(title), '-')
        } else if let Some(title) = line.strip_prefix("### ") {
            clean_math(title)
        } else {
            clean_math(&line.replace("**", ""))
        };

        blocks.push(block);
    }

    blocks.join("\n\n")
}

fn underline(title: &str, marker: char) -> String {
    let width = title.chars().count().max(1);
    format!("{}\n{}", title, marker.to_string().repeat(width))
}
