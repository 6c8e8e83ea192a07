use crate::core::errors::Result;
use serde::{Deserialize, Serialize};

/*-------------------------------------------------------------------------------------------------
  Parse JSON
-------------------------------------------------------------------------------------------------*/

pub fn parse(json: &str) -> Result<JsonMeta<'_>> {
    Ok(serde_json::from_str(json)?)
}

/*-------------------------------------------------------------------------------------------------
  JSON Data Structures
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  JSON Meta
--------------------------------------------------------------------------------------*/

/// The subset of the GitHub meta API document (`https://api.github.com/meta`) that lists IP
/// ranges by service. Missing service lists are empty; other keys are ignored.
#[derive(Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct JsonMeta<'j> {
    #[serde(borrow, default)]
    pub hooks: Vec<&'j str>,
    #[serde(borrow, default)]
    pub web: Vec<&'j str>,
    #[serde(borrow, default)]
    pub api: Vec<&'j str>,
    #[serde(borrow, default)]
    pub git: Vec<&'j str>,
    #[serde(borrow, default)]
    pub github_enterprise_importer: Vec<&'j str>,
    #[serde(borrow, default)]
    pub packages: Vec<&'j str>,
    #[serde(borrow, default)]
    pub pages: Vec<&'j str>,
    #[serde(borrow, default)]
    pub importer: Vec<&'j str>,
    #[serde(borrow, default)]
    pub actions: Vec<&'j str>,
    #[serde(borrow, default)]
    pub copilot: Vec<&'j str>,
    #[serde(borrow, default)]
    pub dependabot: Vec<&'j str>,
    #[serde(borrow, default)]
    pub docker: Vec<&'j str>,
}

impl<'j> JsonMeta<'j> {
    /// Service names paired with their prefix lists, in document order.
    pub fn services(&self) -> [(&'static str, &[&'j str]); 12] {
        [
            ("hooks", self.hooks.as_slice()),
            ("web", self.web.as_slice()),
            ("api", self.api.as_slice()),
            ("git", self.git.as_slice()),
            ("github_enterprise_importer", self.github_enterprise_importer.as_slice()),
            ("packages", self.packages.as_slice()),
            ("pages", self.pages.as_slice()),
            ("importer", self.importer.as_slice()),
            ("actions", self.actions.as_slice()),
            ("copilot", self.copilot.as_slice()),
            ("dependabot", self.dependabot.as_slice()),
            ("docker", self.docker.as_slice()),
        ]
    }

    /// `(prefix, service)` pairs for every listed prefix; empty prefix strings are skipped.
    pub fn entries(&self) -> Vec<(&'j str, &'static str)> {
        self.services()
            .into_iter()
            .flat_map(|(service, prefixes)| prefixes.iter().map(move |prefix| (*prefix, service)))
            .filter(|(prefix, _)| !prefix.is_empty())
            .collect()
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
