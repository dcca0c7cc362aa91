// Colored terminal output for `topicsift classify`.

use colored::Colorize;

use crate::classify::models::TopicResult;

/// Display ranked topics for a single text.
pub fn display_topics(text: &str, topics: &[TopicResult], threshold: f64) {
    println!(
        "\n{}",
        format!("=== Topics for \"{}\" ===", super::truncate_chars(text, 60)).bold()
    );
    println!();

    if topics.is_empty() {
        println!(
            "  {}",
            format!("No topic reached the {threshold:.2} confidence threshold.").dimmed()
        );
        println!();
        return;
    }

    println!(
        "  {:>4}  {:<24} {:>10}",
        "Rank".dimmed(),
        "Topic".dimmed(),
        "Confidence".dimmed(),
    );
    println!("  {}", "-".repeat(42).dimmed());

    for (i, topic) in topics.iter().enumerate() {
        println!(
            "  {:>4}. {:<24} {:>10}",
            i + 1,
            topic.topic,
            colorize_score(topic.confidence_score),
        );
    }
    println!();
}

/// Colorize a confidence score by band.
fn colorize_score(score: f64) -> colored::ColoredString {
    let text = format!("{score:.3}");
    match confidence_band(score) {
        "strong" => text.green().bold(),
        "moderate" => text.yellow(),
        _ => text.dimmed(),
    }
}

fn confidence_band(score: f64) -> &'static str {
    if score >= 0.7 {
        "strong"
    } else if score >= 0.4 {
        "moderate"
    } else {
        "weak"
    }
}
