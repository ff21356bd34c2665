//! Picks the images most likely to illustrate a page.
//!
//! Scores come from layout hint classes and declared `width`/`height`
//! attributes. Images too small to matter are dropped.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::{ImageCandidate, MAX_IMAGES};

/// Class fragments that mark a page's primary illustration.
const HINT_CLASSES: &[&str] = &[
    "hero",
    "featured",
    "thumbnail",
    "main-image",
    "banner",
    "cover",
    "header",
];

const HINT_SCORE: u8 = 4;

/// Score, sort (highest first, document order on ties) and cap the page's images.
pub fn score_images(document: &Html, page_url: &str) -> Vec<ImageCandidate> {
    let Ok(img_sel) = Selector::parse("img") else {
        return Vec::new();
    };
    let base = Url::parse(page_url).ok();

    let mut seen = HashSet::new();
    let mut candidates: Vec<ImageCandidate> = document
        .select(&img_sel)
        .filter_map(|img| {
            let url = resolve_src(img, base.as_ref())?;
            let score = image_score(img)?;
            seen.insert(url.clone()).then_some(ImageCandidate { url, score })
        })
        .collect();

    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates.truncate(MAX_IMAGES);
    candidates
}

/// Absolute image URL; `data:` URIs and unresolvable sources are skipped.
fn resolve_src(img: ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    let src = img
        .value()
        .attr("src")
        .or_else(|| img.value().attr("data-src"))
        .map(str::trim)
        .filter(|s| !s.is_empty())?;
    if src.starts_with("data:") {
        return None;
    }
    let resolved = match base {
        Some(base) => base.join(src).ok()?,
        None => Url::parse(src).ok()?,
    };
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// The best of the hint score and the size score, if either applies.
fn image_score(img: ElementRef<'_>) -> Option<u8> {
    let hinted = img.value().classes().any(|class| {
        let class = class.to_ascii_lowercase();
        HINT_CLASSES.iter().any(|hint| class.contains(hint))
    });
    let width = dimension(img.value().attr("width"));
    let height = dimension(img.value().attr("height"));
    let sized = size_score(width, height);

    match (hinted, sized) {
        (true, _) => Some(HINT_SCORE),
        (false, sized) => sized,
    }
}

/// Score from declared dimensions.
pub(crate) fn size_score(width: u32, height: u32) -> Option<u8> {
    if width >= 2000 && height >= 1000 {
        Some(3)
    } else if width >= 1600 || height >= 800 {
        Some(2)
    } else if width >= 800 || height >= 500 {
        Some(1)
    } else if width >= 500 || height >= 300 {
        Some(0)
    } else {
        None
    }
}

/// Parse `width="640"` or `width="640px"`; anything else counts as 0.
fn dimension(raw: Option<&str>) -> u32 {
    raw.map(|v| v.trim().trim_end_matches("px").trim())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .map_or(0, |v| v.min(f64::from(u32::MAX)) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(html: &str) -> Vec<ImageCandidate> {
        score_images(&Html::parse_document(html), "https://example.com/articles/post")
    }

    #[test]
    fn size_thresholds() {
        assert_eq!(size_score(2000, 1000), Some(3));
        assert_eq!(size_score(2400, 900), Some(2));
        assert_eq!(size_score(1600, 0), Some(2));
        assert_eq!(size_score(0, 800), Some(2));
        assert_eq!(size_score(800, 10), Some(1));
        assert_eq!(size_score(10, 500), Some(1));
        assert_eq!(size_score(500, 0), Some(0));
        assert_eq!(size_score(0, 300), Some(0));
        assert_eq!(size_score(499, 299), None);
        assert_eq!(size_score(0, 0), None);
    }

    #[test]
    fn hint_class_scores_highest() {
        let images = score(
            r#"<img src="/big.jpg" width="2500" height="1200">
               <img src="/hero.jpg" class="post Hero-Image">"#,
        );
        assert_eq!(images.len(), 2);
        assert_eq!(images[0], ImageCandidate {
            url: "https://example.com/hero.jpg".into(),
            score: 4
        });
        assert_eq!(images[1].score, 3);
    }

    #[test]
    fn small_and_data_images_dropped() {
        let images = score(
            r#"<img src="/icon.png" width="32" height="32">
               <img src="data:image/png;base64,AAAA" width="900">
               <img width="900">
               <img src="relative/pic.jpg" width="900px">"#,
        );
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "https://example.com/articles/relative/pic.jpg");
        assert_eq!(images[0].score, 1);
    }

    #[test]
    fn duplicates_removed_and_capped() {
        let mut html = String::from(r#"<img src="/dup.jpg" width="600"><img src="/dup.jpg" width="600">"#);
        for i in 0..15 {
            html.push_str(&format!(r#"<img src="/img{i}.jpg" width="1700">"#));
        }
        let images = score(&html);
        assert_eq!(images.len(), MAX_IMAGES);
        assert!(images.iter().all(|img| img.score == 2));
        assert!(images.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn ties_keep_document_order() {
        let images = score(r#"<img src="/a.jpg" width="900"><img src="/b.jpg" height="600">"#);
        let urls: Vec<_> = images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a.jpg", "https://example.com/b.jpg"]);
    }

    #[test]
    fn lazy_loaded_src_used() {
        let images = score(r#"<img data-src="https://cdn.example.com/x.jpg" class="featured">"#);
        assert_eq!(images[0].url, "https://cdn.example.com/x.jpg");
    }
}
