//! Check the corpus without writing anything

use anyhow::Result;

use crate::report::BuildReport;
use crate::Site;

/// Run the pipeline and return its report
pub fn run(site: &Site) -> Result<BuildReport> {
    let build = site.build()?;
    Ok(build.report)
}
