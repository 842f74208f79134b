use std::fs;
use std::path::Path;

use schcats_bench::config::BenchmarkConfig;
use schcats_bench::driver::MatchRunner;
use sha2::{Digest, Sha256};
use tempfile::tempdir;

fn load_config(output_dir: &Path) -> BenchmarkConfig {
    let yaml = format!(
        r#"
run_id: "test_smoke"
matches:
  count: 3
  rounds_per_match: 6
  seed: 4242
agents:
  - name: "tom0"
    kind: "zero_order"
  - name: "tom1"
    kind: "first_order"
    params:
      doubt_threshold: 0.3
outputs:
  jsonl: "{jsonl}"
  rounds_jsonl: "{rounds}"
  summary_md: "{summary}"
  plots_dir: "{plots}"
metrics:
  focus: "tom1"
logging:
  enable_structured: false
"#,
        jsonl = output_dir.join("matches.jsonl").display(),
        rounds = output_dir.join("rounds.jsonl").display(),
        summary = output_dir.join("summary.md").display(),
        plots = output_dir.join("plots").display()
    );

    let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

fn sha256_hex(path: &Path) -> String {
    let bytes = fs::read(path).expect("output readable");
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

#[test]
fn same_seed_produces_identical_jsonl() {
    let first = tempdir().expect("temp dir");
    let second = tempdir().expect("temp dir");

    let mut digests = Vec::new();
    for dir in [first.path(), second.path()] {
        let config = load_config(dir);
        let outputs = config.resolved_outputs();
        let runner = MatchRunner::new(config, outputs).expect("runner created");
        let summary = runner.run().expect("matches complete");

        assert_eq!(summary.matches_played, 3);
        assert_eq!(summary.seatings, 2);
        assert_eq!(summary.rows_written, 6);
        assert!(summary.summary_path.exists(), "summary markdown missing");
        // Plot rendering is optional; ensure any failure surfaces explicitly
        if let Some(plot_path) = summary.plot_path {
            assert!(plot_path.exists(), "plot path reported but missing on disk");
        }

        let rounds_path = summary.rounds_path.expect("rounds output configured");
        digests.push((sha256_hex(&summary.jsonl_path), sha256_hex(&rounds_path)));
    }

    assert_eq!(digests[0], digests[1], "outputs differ between identical runs");
}

#[test]
fn match_rows_account_for_every_round() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(dir.path());
    let outputs = config.resolved_outputs();
    let runner = MatchRunner::new(config, outputs).expect("runner created");
    let summary = runner.run().expect("matches complete");

    let jsonl = fs::read_to_string(&summary.jsonl_path).expect("jsonl readable");
    let rows: Vec<serde_json::Value> = jsonl
        .lines()
        .map(|line| serde_json::from_str(line).expect("row decodes to JSON"))
        .collect();
    assert_eq!(rows.len(), 6);

    for row in &rows {
        let p0 = row["p0_wins"].as_u64().expect("p0 wins");
        let p1 = row["p1_wins"].as_u64().expect("p1 wins");
        assert_eq!(p0 + p1, 6);
        assert_eq!(row["rounds"].as_u64(), Some(6));
    }

    // Both seatings of a match share the environment seed.
    assert_eq!(rows[0]["seed"], rows[1]["seed"]);
    assert_eq!(rows[0]["seating"], "original");
    assert_eq!(rows[1]["seating"], "swapped");
    assert_eq!(rows[0]["p0_agent"], "tom0");
    assert_eq!(rows[1]["p0_agent"], "tom1");
    assert_eq!(rows[2]["seed"].as_u64(), Some(4243));

    let rounds_path = summary.rounds_path.expect("rounds output configured");
    let rounds = fs::read_to_string(rounds_path).expect("rounds readable");
    assert_eq!(rounds.lines().count(), 36);
    let first: serde_json::Value =
        serde_json::from_str(rounds.lines().next().expect("first round")).expect("round json");
    assert_eq!(first["match_id"], "M00000_original");
    assert_eq!(first["round_idx"], 0);

    let markdown = fs::read_to_string(&summary.summary_path).expect("summary readable");
    assert!(markdown.contains("| tom1 | FirstOrder | 36 |"));
    assert!(summary.focus_win_rate.is_some());
}
