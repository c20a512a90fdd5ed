use chrono::NaiveDate;

/// Ordered query-string parameters with the cleanliness rules every resource
/// client relies on: no `None`, no empty or whitespace-only values, dates as
/// ISO `YYYY-MM-DD`, list filters comma-joined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, key: &str, value: &str) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            self.pairs.push((key.to_string(), trimmed.to_string()));
        }
    }

    pub fn push_opt_str(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.push_str(key, value);
        }
    }

    pub fn push_bool(&mut self, key: &str, value: Option<bool>) {
        if let Some(value) = value {
            self.pairs.push((key.to_string(), value.to_string()));
        }
    }

    pub fn push_u32(&mut self, key: &str, value: Option<u32>) {
        if let Some(value) = value {
            self.pairs.push((key.to_string(), value.to_string()));
        }
    }

    pub fn push_date(&mut self, key: &str, value: Option<NaiveDate>) {
        if let Some(value) = value {
            self.pairs
                .push((key.to_string(), value.format("%Y-%m-%d").to_string()));
        }
    }

    /// Comma-joins the non-empty entries; pushes nothing for an empty list.
    pub fn push_list<I, S>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined: Vec<String> = values
            .into_iter()
            .map(|value| value.as_ref().trim().to_string())
            .filter(|value| !value.is_empty())
            .collect();
        if !joined.is_empty() {
            self.pairs.push((key.to_string(), joined.join(",")));
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}
