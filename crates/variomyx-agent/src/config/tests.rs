#[cfg(test)]
mod tests {
    use super::super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("variomyx.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_default_log_filter() {
        assert_eq!(default_log_filter(), "variomyx=debug,info");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "analysis_path = \"analysis.yaml\"\nbundle_path = \"family.json\"\n");

        let config = AgentConfig::load_from(&path).unwrap();

        assert_eq!(config.log_filter, "variomyx=debug,info");
        assert!(config.score_tables.is_empty());
        assert!(config.report.pretty);
        assert_eq!(config.analysis_path, dir.path().join("analysis.yaml"));
    }

    #[test]
    fn test_score_tables_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
log_filter = "variomyx=trace"
analysis_path = "/data/analysis.yaml"
bundle_path = "family.json"

[[score_tables]]
priority = "HI_PHIVE"
path = "hiphive.csv"

[report]
path = "out/report.json"
pretty = false
"#,
        );

        let config = AgentConfig::load_from(&path).unwrap();

        assert_eq!(config.analysis_path, PathBuf::from("/data/analysis.yaml"));
        assert_eq!(config.score_tables[0].priority, PriorityKind::HiPhive);
        assert_eq!(config.score_tables[0].path, dir.path().join("hiphive.csv"));
        assert_eq!(config.report.path, Some(dir.path().join("out/report.json")));
        assert!(!config.report.pretty);
    }

    #[test]
    fn test_missing_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AgentConfig::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
