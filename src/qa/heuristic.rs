//! Deterministic keyword-driven Q&A responder, used when no LLM credential
//! is configured or the remote call fails.
//!
//! The branch order and the positional (non-sorted) "most confident" /
//! "most prominent" / "first object" behaviors are part of the observable
//! contract and are kept exactly as they are.

use lazy_static::lazy_static;
use regex::Regex;

use crate::detect::dto::Detection;

const NO_OBJECTS: &str =
    "I don't see any objects in the image. Could you upload an image with detectable objects?";

const COUNT_WORDS: &[&str] = &["how many", "count", "number of"];
const ABOVE_WORDS: &[&str] = &["above", "over", "more than", "greater than", "higher than"];
const BELOW_WORDS: &[&str] = &["below", "under", "less than", "lower than"];
const WHAT_WORDS: &[&str] = &["what", "which", "identify"];
const HIGHEST_WORDS: &[&str] = &["highest", "most confident", "best"];
const LOWEST_WORDS: &[&str] = &["lowest", "least confident", "worst"];
const LARGEST_WORDS: &[&str] = &["largest", "biggest"];
const SMALLEST_WORDS: &[&str] = &["smallest", "tiniest"];
const WHERE_WORDS: &[&str] = &["where", "location", "position"];

pub fn answer(question: &str, detections: &[Detection]) -> String {
    if detections.is_empty() {
        return NO_OBJECTS.to_string();
    }

    let q = question.to_lowercase();
    let labels: Vec<&str> = detections.iter().map(|d| d.label.as_str()).collect();
    let list = format_label_list(&labels);

    if contains_any(&q, COUNT_WORDS) {
        count_answer(&q, detections, &labels, &list)
    } else if contains_any(&q, WHAT_WORDS) {
        format!(
            "The image contains {list}. These objects were detected with varying confidence \
             levels, with {} being the most prominent.",
            labels[0]
        )
    } else if contains_any(&q, HIGHEST_WORDS) {
        let best = first_max_by(detections, confidence);
        format!(
            "The object detected with highest confidence is {} at {:.0}% confidence.",
            best.label,
            confidence(best) * 100.0
        )
    } else if contains_any(&q, LOWEST_WORDS) {
        let worst = first_min_by(detections, confidence);
        format!(
            "The object with lowest confidence is {} at {:.0}% confidence.",
            worst.label,
            confidence(worst) * 100.0
        )
    } else if contains_any(&q, LARGEST_WORDS) {
        let largest = first_max_by(detections, |d| d.bbox.area());
        format!(
            "The largest object is {} with {:.0}% confidence. It has an area of {:.0} square pixels.",
            largest.label,
            confidence(largest) * 100.0,
            largest.bbox.area()
        )
    } else if contains_any(&q, SMALLEST_WORDS) {
        let smallest = first_min_by(detections, |d| d.bbox.area());
        format!(
            "The smallest object is {} with {:.0}% confidence.",
            smallest.label,
            confidence(smallest) * 100.0
        )
    } else if let Some(mentioned) = detections
        .iter()
        .find(|d| q.contains(&d.label.to_lowercase()))
    {
        format!(
            "Yes, I can see a {} with {:.0}% confidence. It's located at position \
             (x: {}, y: {}) with dimensions {}x{} pixels.",
            mentioned.label,
            confidence(mentioned) * 100.0,
            fmt_num(mentioned.bbox.x),
            fmt_num(mentioned.bbox.y),
            fmt_num(mentioned.bbox.width),
            fmt_num(mentioned.bbox.height)
        )
    } else if contains_any(&q, WHERE_WORDS) {
        let first = &detections[0];
        format!(
            "The detected objects are positioned throughout the image. {} is at ({}, {}), \
             while others are distributed across different areas.",
            labels[0],
            fmt_num(first.bbox.x),
            fmt_num(first.bbox.y)
        )
    } else {
        let lo = confidence(first_min_by(detections, confidence));
        let hi = confidence(first_max_by(detections, confidence));
        format!(
            "Based on the image analysis, I detected {} objects: {list}. The detection \
             confidence ranges from {:.0}% to {:.0}%. What specific aspect would you like to \
             know more about?",
            detections.len(),
            lo * 100.0,
            hi * 100.0
        )
    }
}

fn count_answer(q: &str, detections: &[Detection], labels: &[&str], list: &str) -> String {
    lazy_static! {
        static ref THRESHOLD_RE: Regex = Regex::new(r"(\d+)%?\s*(?:confidence|percent)").unwrap();
    }

    if let Some(cap) = THRESHOLD_RE.captures(q) {
        // The digits print back as written; the comparison happens in
        // fractional space. Values beyond f64 range overflow to infinity,
        // so an absurd threshold matches nothing above it.
        let pct = cap.get(1).map_or("0", |m| m.as_str());
        let threshold = pct.parse::<f64>().unwrap_or(f64::INFINITY) / 100.0;

        if contains_any(q, ABOVE_WORDS) {
            let matching: Vec<&str> = detections
                .iter()
                .filter(|d| confidence(d) > threshold)
                .map(|d| d.label.as_str())
                .collect();
            return if matching.is_empty() {
                format!("No objects were detected with confidence above {pct}%.")
            } else {
                format!(
                    "There are {} objects detected with confidence above {pct}%: {}.",
                    matching.len(),
                    matching.join(", ")
                )
            };
        }
        if contains_any(q, BELOW_WORDS) {
            let matching: Vec<&str> = detections
                .iter()
                .filter(|d| confidence(d) < threshold)
                .map(|d| d.label.as_str())
                .collect();
            return if matching.is_empty() {
                format!("No objects were detected with confidence below {pct}%.")
            } else {
                format!(
                    "There are {} objects detected with confidence below {pct}%: {}.",
                    matching.len(),
                    matching.join(", ")
                )
            };
        }
    }

    // Positional: the first detection is reported as most confident.
    format!(
        "I can see {} objects in the image: {list}. The most confident detection is {} at \
         {:.0}% confidence.",
        detections.len(),
        labels[0],
        confidence(&detections[0]) * 100.0
    )
}

/// Scores above 1 are treated as already-percent values ([0,100] producers).
pub(crate) fn confidence(d: &Detection) -> f64 {
    if d.score > 1.0 {
        d.score / 100.0
    } else {
        d.score
    }
}

/// `"a"`, `"a, and b"`, `"a, b, and c"`.
fn format_label_list(labels: &[&str]) -> String {
    match labels {
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
        [] => String::new(),
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// First element with the maximal key; ties keep the earliest (matching the
/// reference responder's behavior).
fn first_max_by(detections: &[Detection], key: impl Fn(&Detection) -> f64) -> &Detection {
    detections
        .iter()
        .fold(&detections[0], |acc, d| if key(d) > key(acc) { d } else { acc })
}

fn first_min_by(detections: &[Detection], key: impl Fn(&Detection) -> f64) -> &Detection {
    detections
        .iter()
        .fold(&detections[0], |acc, d| if key(d) < key(acc) { d } else { acc })
}

/// Integral values print without a trailing `.0`, mirroring how the
/// coordinates usually arrive (whole pixels).
pub(crate) fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::dto::BoundingBox;

    fn det(label: &str, score: f64, x: f64, y: f64, w: f64, h: f64) -> Detection {
        Detection {
            label: label.into(),
            score,
            bbox: BoundingBox {
                x,
                y,
                width: w,
                height: h,
            },
        }
    }

    fn sample() -> Vec<Detection> {
        vec![
            det("car", 0.94, 80.0, 120.0, 180.0, 160.0),
            det("person", 0.5, 0.0, 0.0, 10.0, 10.0),
        ]
    }

    #[test]
    fn empty_detections_fixed_message_regardless_of_question() {
        for q in ["how many objects?", "where is the car?", ""] {
            assert_eq!(answer(q, &[]), NO_OBJECTS);
        }
    }

    #[test]
    fn count_above_threshold_reports_matching_labels() {
        let a = answer("how many objects above 60% confidence", &sample());
        assert_eq!(
            a,
            "There are 1 objects detected with confidence above 60%: car."
        );
    }

    #[test]
    fn count_below_threshold() {
        let a = answer("count objects below 60% confidence", &sample());
        assert_eq!(
            a,
            "There are 1 objects detected with confidence below 60%: person."
        );
    }

    #[test]
    fn count_above_threshold_none_matching() {
        let a = answer("how many objects above 99% confidence", &sample());
        assert_eq!(a, "No objects were detected with confidence above 99%.");
    }

    #[test]
    fn count_threshold_accepts_percent_word() {
        let a = answer("how many objects with more than 60 percent", &sample());
        assert_eq!(
            a,
            "There are 1 objects detected with confidence above 60%: car."
        );
    }

    #[test]
    fn count_above_oversized_threshold_matches_nothing() {
        // Larger than any integer type holds; must not wrap to a zero
        // threshold and report everything.
        let a = answer(
            "how many objects above 99999999999999999999% confidence",
            &sample(),
        );
        assert_eq!(
            a,
            "No objects were detected with confidence above 99999999999999999999%."
        );
    }

    #[test]
    fn count_below_oversized_threshold_matches_everything() {
        let a = answer(
            "count objects below 99999999999999999999% confidence",
            &sample(),
        );
        assert_eq!(
            a,
            "There are 2 objects detected with confidence below 99999999999999999999%: \
             car, person."
        );
    }

    #[test]
    fn count_without_threshold_reports_first_as_most_confident() {
        // Positional, not sorted: the first detection is called most
        // confident even when it is not.
        let dets = vec![
            det("person", 0.5, 0.0, 0.0, 10.0, 10.0),
            det("car", 0.94, 80.0, 120.0, 180.0, 160.0),
        ];
        let a = answer("how many objects do you see?", &dets);
        assert_eq!(
            a,
            "I can see 2 objects in the image: person, and car. The most confident detection \
             is person at 50% confidence."
        );
    }

    #[test]
    fn counting_wins_over_later_branches() {
        let a = answer("how many objects, and which is the largest?", &sample());
        assert!(a.starts_with("I can see 2 objects"));
    }

    #[test]
    fn what_branch_lists_labels_with_first_as_most_prominent() {
        let a = answer("what do you see?", &sample());
        assert_eq!(
            a,
            "The image contains car, and person. These objects were detected with varying \
             confidence levels, with car being the most prominent."
        );
    }

    #[test]
    fn highest_branch_uses_actual_maximum() {
        let dets = vec![
            det("person", 0.5, 0.0, 0.0, 10.0, 10.0),
            det("car", 0.94, 80.0, 120.0, 180.0, 160.0),
        ];
        let a = answer("highest confidence?", &dets);
        assert_eq!(
            a,
            "The object detected with highest confidence is car at 94% confidence."
        );
    }

    #[test]
    fn lowest_branch_uses_actual_minimum() {
        let a = answer("lowest confidence?", &sample());
        assert_eq!(
            a,
            "The object with lowest confidence is person at 50% confidence."
        );
    }

    #[test]
    fn largest_branch_compares_bbox_area() {
        let a = answer("what is the largest object", &sample());
        // "what" loses to nothing here: counting not present, and the what
        // branch fires before largest.
        assert!(a.starts_with("The image contains"));

        let a = answer("show me the largest object", &sample());
        assert_eq!(
            a,
            "The largest object is car with 94% confidence. It has an area of 28800 square pixels."
        );
    }

    #[test]
    fn smallest_branch() {
        let a = answer("show the smallest thing", &sample());
        assert_eq!(a, "The smallest object is person with 50% confidence.");
    }

    #[test]
    fn label_mention_reports_position_and_size() {
        let a = answer("is there a car in the picture?", &sample());
        assert_eq!(
            a,
            "Yes, I can see a car with 94% confidence. It's located at position (x: 80, y: 120) \
             with dimensions 180x160 pixels."
        );
    }

    #[test]
    fn where_branch_reports_first_detection() {
        let dets = vec![det("tree", 0.8, 20.0, 30.0, 80.0, 60.0)];
        let a = answer("where is everything located", &dets);
        assert_eq!(
            a,
            "The detected objects are positioned throughout the image. tree is at (20, 30), \
             while others are distributed across different areas."
        );
    }

    #[test]
    fn default_branch_reports_confidence_range() {
        let a = answer("tell me something", &sample());
        assert_eq!(
            a,
            "Based on the image analysis, I detected 2 objects: car, and person. The detection \
             confidence ranges from 50% to 94%. What specific aspect would you like to know \
             more about?"
        );
    }

    #[test]
    fn percent_scale_scores_are_normalized() {
        let dets = vec![
            det("car", 94.0, 0.0, 0.0, 1.0, 1.0),
            det("person", 50.0, 0.0, 0.0, 1.0, 1.0),
        ];
        let a = answer("how many above 60% confidence", &dets);
        assert_eq!(
            a,
            "There are 1 objects detected with confidence above 60%: car."
        );
    }

    #[test]
    fn tie_on_confidence_keeps_first() {
        let dets = vec![
            det("first", 0.9, 0.0, 0.0, 1.0, 1.0),
            det("second", 0.9, 0.0, 0.0, 1.0, 1.0),
        ];
        let a = answer("highest confidence", &dets);
        assert!(a.contains("is first at"));
    }

    #[test]
    fn single_label_list_has_no_and() {
        let a = answer("what is this", &[det("car", 0.9, 0.0, 0.0, 1.0, 1.0)]);
        assert!(a.starts_with("The image contains car. "));
    }

    #[test]
    fn fmt_num_drops_trailing_zero_fraction() {
        assert_eq!(fmt_num(80.0), "80");
        assert_eq!(fmt_num(80.5), "80.5");
        assert_eq!(fmt_num(-3.0), "-3");
    }
}
