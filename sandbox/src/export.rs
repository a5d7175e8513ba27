//! Standalone export of an artifact as a complete HTML page.
//!
//! The exported page loads the same client-side libraries generated markup is
//! allowed to use, so it renders outside the preview surface.

use crate::engine::clean_artifact;

/// Suggested file name for downloads.
pub const EXPORT_FILE_NAME: &str = "index.html";

/// Title of the exported page.
pub const EXPORT_TITLE: &str = "Generated Site";

/// One external asset referenced from the exported `<head>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
    Script(&'static str),
    Stylesheet(&'static str),
}

/// Styling and behavior libraries, in load order.
pub const EXPORT_ASSETS: [Asset; 14] = [
    Asset::Script("https://cdn.tailwindcss.com"),
    Asset::Stylesheet("https://cdnjs.cloudflare.com/ajax/libs/flowbite/2.3.0/flowbite.min.css"),
    Asset::Script("https://cdnjs.cloudflare.com/ajax/libs/flowbite/2.3.0/flowbite.min.js"),
    Asset::Script("https://unpkg.com/lucide@latest/dist/umd/lucide.js"),
    Asset::Script("https://cdn.jsdelivr.net/npm/chart.js"),
    Asset::Stylesheet("https://cdnjs.cloudflare.com/ajax/libs/aos/2.3.4/aos.css"),
    Asset::Script("https://cdnjs.cloudflare.com/ajax/libs/aos/2.3.4/aos.js"),
    Asset::Script("https://cdnjs.cloudflare.com/ajax/libs/gsap/3.12.2/gsap.min.js"),
    Asset::Script("https://cdnjs.cloudflare.com/ajax/libs/lottie-web/5.11.2/lottie.min.js"),
    Asset::Stylesheet("https://cdn.jsdelivr.net/npm/swiper@10/swiper-bundle.min.css"),
    Asset::Script("https://cdn.jsdelivr.net/npm/swiper@10/swiper-bundle.min.js"),
    Asset::Stylesheet("https://unpkg.com/tippy.js@6/dist/tippy.css"),
    Asset::Script("https://unpkg.com/@popperjs/core@2"),
    Asset::Script("https://unpkg.com/tippy.js@6"),
];

impl Asset {
    fn tag(self) -> String {
        match self {
            Self::Script(src) => format!("<script src=\"{src}\"></script>"),
            Self::Stylesheet(href) => format!("<link href=\"{href}\" rel=\"stylesheet\" />"),
        }
    }
}

/// Wrap an artifact (fenced or not) in a full page.
#[must_use]
pub fn export_document(artifact: &str) -> String {
    let body = clean_artifact(artifact);
    let assets: String = EXPORT_ASSETS
        .iter()
        .map(|asset| format!("    {}\n", asset.tag()))
        .collect();
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\" />\n    \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n    \
         <title>{EXPORT_TITLE}</title>\n{assets}</head>\n<body id=\"root\">\n{}\n</body>\n</html>\n",
        body.trim()
    )
}
