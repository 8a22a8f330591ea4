use url::Url;

use crate::data::export::ExportRequest;
use crate::data::model::DatasetId;

const API_PREFIX: &str = "api/data-import/";

/// URL layout of the public data endpoints under a configured base address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    root: Url,
}

impl Endpoints {
    /// `base` is the server address, e.g. `http://localhost:8000`.
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base.trim())?;
        if base.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            root: base.join(API_PREFIX)?,
        })
    }

    pub fn datasets(&self) -> Result<Url, url::ParseError> {
        self.root.join("public-datasets/")
    }

    pub fn metadata(&self, id: DatasetId) -> Result<Url, url::ParseError> {
        self.root.join(&format!("public-metadata/{id}/"))
    }

    pub fn data(&self, id: DatasetId) -> Result<Url, url::ParseError> {
        self.root.join(&format!("public-data/{id}/"))
    }

    pub fn search(&self, query: &str) -> Result<Url, url::ParseError> {
        let mut url = self.root.join("public-search/")?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }

    pub fn download(&self, request: &ExportRequest) -> Result<Url, url::ParseError> {
        let mut url = self
            .root
            .join(&format!("public-download/{}/", request.dataset_id))?;
        url.query_pairs_mut().extend_pairs(request.query_pairs());
        Ok(url)
    }
}
