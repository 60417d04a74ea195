use std::{collections::HashMap, str::FromStr};

use super::error::TypeError;

/// Decoded query-string pairs; repeated keys are kept in order.
pub type FormData = Vec<(String, String)>;

#[derive(Debug, Default, Clone)]
pub struct Form {
    inner: HashMap<String, Vec<String>>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        let mut inner: HashMap<String, Vec<String>> = HashMap::new();
        data.into_iter()
            .for_each(|(key, value)| inner.entry(key).or_default().push(value));

        Self { inner }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(|values| values.first())
            .map(|value| value.as_str())
    }

    /// Every value of a repeated key, with comma separated values split apart.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.inner
            .get(key)
            .map(|values| {
                values
                    .iter()
                    .flat_map(|value| value.split(','))
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_number<T>(&self, key: &str) -> Result<Option<T>, TypeError>
    where
        T: FromStr,
    {
        match self.get_str(key) {
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_e| TypeError::new(&format!("Invalid number for '{key}'"))),
            None => Ok(None),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, TypeError> {
        match self.get_str(key).map(str::trim) {
            None | Some("") => Ok(false),
            Some("1") | Some("true") | Some("True") => Ok(true),
            Some("0") | Some("false") | Some("False") => Ok(false),
            Some(_) => Err(TypeError::new(&format!("Invalid boolean for '{key}'"))),
        }
    }
}
