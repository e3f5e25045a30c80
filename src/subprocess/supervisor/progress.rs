//! Build progress gathered from stdout while the child runs

use crate::cargo::message::CargoMessage;

/// Counts `compiler-artifact` records seen on stdout
#[derive(Debug, Default, Clone)]
pub struct ArtifactProgress {
    compiled: usize,
    last_artifact: String,
}

impl ArtifactProgress {
    /// Inspect one stdout line; anything that is not an artifact record is ignored
    pub fn observe(&mut self, line: &str) {
        if let Some(CargoMessage::CompilerArtifact(artifact)) = CargoMessage::parse(line) {
            self.compiled += 1;
            self.last_artifact = artifact.target.name;
        }
    }

    pub fn compiled(&self) -> usize {
        self.compiled
    }

    pub fn last_artifact(&self) -> &str {
        &self.last_artifact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_artifacts_and_ignores_noise() {
        let mut progress = ArtifactProgress::default();

        progress.observe(r#"{"reason":"compiler-artifact","fresh":true,"target":{"name":"libc","src_path":"/r/libc/src/lib.rs"}}"#);
        progress.observe("   Compiling foo v0.1.0");
        progress.observe(r#"{"reason":"compiler-artifact","target":"#);
        progress.observe(r#"{"reason":"build-finished","success":true}"#);
        progress.observe(r#"{"reason":"compiler-artifact","fresh":false,"target":{"name":"app","src_path":"/w/src/main.rs"}}"#);

        assert_eq!(progress.compiled(), 2);
        assert_eq!(progress.last_artifact(), "app");
    }
}
