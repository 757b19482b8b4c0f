use std::path::PathBuf;

use crate::prep::TargetOs;

use super::Fs;

/// Paths of the artifacts a task attempt produces, all directly under the
/// execute directory and named after the attempt's application id.
impl Fs {
    /// $EXECUTE_DIR/<app_id>_node.sh (or .bat)
    pub fn script(&self, app_id: &str, os: TargetOs) -> PathBuf {
        self.execute_dir
            .join(format!("{app_id}_node.{}", os.script_extension()))
    }

    /// $EXECUTE_DIR/<app_id>_flinkx_job.json
    pub fn job_descriptor(&self, app_id: &str) -> PathBuf {
        self.execute_dir.join(format!("{app_id}_flinkx_job.json"))
    }

    /// $EXECUTE_DIR/<app_id>.log
    pub fn task_log(&self, app_id: &str) -> PathBuf {
        self.execute_dir.join(format!("{app_id}.log"))
    }
}
