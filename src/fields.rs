use std::str::FromStr;

use crate::error::CiteError;

/// The fields a rendered citation can draw on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Author,
    Title,
    Publisher,
    PublishDate,
    AccessDate,
    Url,
}

impl FromStr for Field {
    type Err = CiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "author" => Ok(Field::Author),
            "title" => Ok(Field::Title),
            "publisher" => Ok(Field::Publisher),
            // `pub_date` is the override key the original tool used.
            "publish_date" | "pub_date" => Ok(Field::PublishDate),
            "access_date" => Ok(Field::AccessDate),
            "url" => Ok(Field::Url),
            _ => Err(CiteError::InvalidField {
                name: s.to_string(),
            }),
        }
    }
}

/// Field mapping for one citation. All values are optional; the formatter
/// degrades gracefully when a field is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationFields {
    pub author: Option<String>,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub publish_date: Option<String>,
    pub access_date: Option<String>,
    pub url: Option<String>,
}

impl CitationFields {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Author => self.author.as_deref(),
            Field::Title => self.title.as_deref(),
            Field::Publisher => self.publisher.as_deref(),
            Field::PublishDate => self.publish_date.as_deref(),
            Field::AccessDate => self.access_date.as_deref(),
            Field::Url => self.url.as_deref(),
        }
    }

    /// User-supplied value supersedes whatever was extracted.
    pub fn apply_override(&mut self, field: Field, value: &str) {
        let slot = match field {
            Field::Author => &mut self.author,
            Field::Title => &mut self.title,
            Field::Publisher => &mut self.publisher,
            Field::PublishDate => &mut self.publish_date,
            Field::AccessDate => &mut self.access_date,
            Field::Url => &mut self.url,
        };
        *slot = Some(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_from_str_accepts_known_names() {
        assert_eq!(Field::from_str("author").unwrap(), Field::Author);
        assert_eq!(Field::from_str("Publisher").unwrap(), Field::Publisher);
        assert_eq!(Field::from_str("publish_date").unwrap(), Field::PublishDate);
        assert_eq!(Field::from_str("pub_date").unwrap(), Field::PublishDate);
        assert_eq!(Field::from_str("url").unwrap(), Field::Url);
    }

    #[test]
    fn field_from_str_rejects_unknown_names() {
        let err = Field::from_str("authr").unwrap_err();
        assert!(err.to_string().contains("unknown field `authr`"));
        assert!(err.to_string().contains("publish_date"));
    }

    #[test]
    fn override_replaces_extracted_value() {
        let mut fields = CitationFields {
            author: Some("Jane Roe".to_string()),
            ..Default::default()
        };
        fields.apply_override(Field::Author, "John Doe");
        assert_eq!(fields.get(Field::Author), Some("John Doe"));
    }
}
