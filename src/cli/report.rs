//! Human-readable rendering of cross-sample consumer rankings.

#![allow(missing_docs)]

use colored::Colorize;

use crate::analysis::{MetricRanking, TopConsumers};

/// One block per metric: a bold title, then numbered commands with their
/// average and PIDs.
#[must_use]
pub fn render_consumers(report: &TopConsumers) -> String {
    let mut out = String::new();
    for (i, ranking) in report.rankings.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let title = format!(
            "{} ({} profile, {} samples)",
            ranking.metric,
            report.profile,
            report.timestamps.len()
        );
        out.push_str(&title.bold().to_string());
        out.push('\n');
        out.push_str(&ranking_lines(ranking));
    }
    out
}

fn ranking_lines(ranking: &MetricRanking) -> String {
    if ranking.consumers.is_empty() {
        return "  (no samples)\n".to_string();
    }
    let width = ranking
        .consumers
        .iter()
        .map(|c| c.command.chars().count())
        .max()
        .unwrap_or(0);
    ranking
        .consumers
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{:>3}  {:<width$}  {:>12.2}  pids {}\n",
                i + 1,
                c.command,
                c.average,
                c.pids.join(",")
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Consumer, ConsumerProfile};

    fn report() -> TopConsumers {
        TopConsumers {
            profile: ConsumerProfile::Cpu,
            timestamps: vec!["10:00:01".into(), "10:00:02".into()],
            rankings: vec![
                MetricRanking {
                    metric: "%usr".into(),
                    consumers: vec![
                        Consumer {
                            command: "java".into(),
                            pids: vec!["2211".into(), "2212".into()],
                            average: 60.0,
                            values: vec![80.0, 40.0],
                        },
                        Consumer {
                            command: "python3 worker.py".into(),
                            pids: vec!["3001".into()],
                            average: 5.0,
                            values: vec![0.0, 10.0],
                        },
                    ],
                },
                MetricRanking {
                    metric: "%wait".into(),
                    consumers: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn blocks_list_ranked_commands() {
        colored::control::set_override(false);
        let out = render_consumers(&report());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "%usr (cpu profile, 2 samples)");
        assert_eq!(lines[1], "  1  java                      60.00  pids 2211,2212");
        assert_eq!(lines[2], "  2  python3 worker.py          5.00  pids 3001");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "%wait (cpu profile, 2 samples)");
        assert_eq!(lines[5], "  (no samples)");
    }
}
