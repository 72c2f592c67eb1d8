pub const DEFAULT_BASE_URL: &str = "https://fonts.gstatic.com/s/i";

const BASE_PLACEHOLDER: &str = "{base}";
const SLUG_PLACEHOLDER: &str = "{slug}";

/// Material Symbols (default style, then weight / fill variants, then the
/// rounded family) ahead of the legacy Material Icons family.
const DEFAULT_TEMPLATES: [&str; 7] = [
    "{base}/short-term/release/materialsymbolsoutlined/{slug}/default/24px.svg",
    "{base}/short-term/release/materialsymbolsoutlined/{slug}/wght400/24px.svg",
    "{base}/short-term/release/materialsymbolsoutlined/{slug}/fill1/24px.svg",
    "{base}/short-term/release/materialsymbolsoutlined/{slug}/wght500/24px.svg",
    "{base}/short-term/release/materialsymbolsrounded/{slug}/default/24px.svg",
    "{base}/materialicons/{slug}/v12/24px.svg",
    "{base}/materialiconsoutlined/{slug}/v12/24px.svg",
];

#[must_use]
pub fn default_templates() -> Vec<String> {
    DEFAULT_TEMPLATES.iter().map(|template| (*template).to_string()).collect()
}

#[must_use]
pub fn render_template(template: &str, base_url: &str, slug: &str) -> String {
    template
        .replace(BASE_PLACEHOLDER, base_url.trim_end_matches('/'))
        .replace(SLUG_PLACEHOLDER, slug)
}
