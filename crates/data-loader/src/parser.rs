//! Parsers for the two CSV tables.
//!
//! - ratings.csv: userId,movieId,rating[,timestamp]
//! - movies_metadata.csv: id (or movieId),title,genres,vote_average,vote_count, plus
//!   any number of columns we don't care about
//!
//! Records are read as `csv::StringRecord`s and fields are looked up by header
//! position. The metadata table has ragged rows, so a short row simply yields
//! missing optional fields instead of an error.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Open a file for parsing. Both error variants carry the path.
fn open_file(path: &Path) -> Result<BufReader<File>> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        }),
        Err(source) => Err(DataLoadError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

fn csv_reader<R: Read>(reader: R, trim: Trim) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(trim)
        .from_reader(reader)
}

/// Find the position of the first header matching any of `names`
fn column_index(headers: &StringRecord, names: &[&str], file: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| names.contains(&h))
        .ok_or_else(|| DataLoadError::MissingColumn {
            file: file.to_string(),
            column: names.join("|"),
        })
}

fn optional_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// Coerce a raw movieId field.
///
/// Accepts plain integers and integral floats ("862.0"); anything else
/// (dates, blanks, negative numbers) is `None`.
pub fn parse_movie_id(raw: &str) -> Option<MovieId> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<MovieId>() {
        return Some(id);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= MovieId::MAX as f64 {
        Some(value as MovieId)
    } else {
        None
    }
}

// =============================================================================
// Ratings
// =============================================================================

/// Parse the ratings table from disk
pub fn parse_ratings(path: &Path) -> Result<Vec<RatingRecord>> {
    let file = open_file(path)?;
    parse_ratings_from_reader(file, &path.display().to_string())
}

/// Parse ratings from any reader. `source` names the input in errors.
///
/// An unparsable userId or rating aborts the whole parse. An unparsable
/// movieId does not: the record comes back with `movie_id: None`.
pub fn parse_ratings_from_reader<R: Read>(reader: R, source: &str) -> Result<Vec<RatingRecord>> {
    let mut rdr = csv_reader(reader, Trim::All);
    let csv_err = |e: csv::Error| DataLoadError::Csv {
        file: source.to_string(),
        source: e,
    };

    let headers = rdr.headers().map_err(csv_err)?.clone();
    let user_col = column_index(&headers, &["userId"], source)?;
    let movie_col = column_index(&headers, &["movieId"], source)?;
    let rating_col = column_index(&headers, &["rating"], source)?;
    let timestamp_col = optional_column(&headers, "timestamp");

    let mut ratings = Vec::new();
    let mut record = StringRecord::new();

    while rdr.read_record(&mut record).map_err(csv_err)? {
        let line = line_of(&record);
        let field = |idx: usize, name: &str| {
            record.get(idx).ok_or_else(|| DataLoadError::ParseError {
                file: source.to_string(),
                line,
                reason: format!("Missing {}", name),
            })
        };

        let user_raw = field(user_col, "userId")?;
        let movie_raw = field(movie_col, "movieId")?;
        let rating_raw = field(rating_col, "rating")?;

        let user_id = user_raw.parse().map_err(|e| DataLoadError::ParseError {
            file: source.to_string(),
            line,
            reason: format!("Invalid userId '{}': {}", user_raw, e),
        })?;
        let rating: f32 = rating_raw.parse().map_err(|e| DataLoadError::ParseError {
            file: source.to_string(),
            line,
            reason: format!("Invalid rating '{}': {}", rating_raw, e),
        })?;
        if !rating.is_finite() {
            return Err(DataLoadError::ParseError {
                file: source.to_string(),
                line,
                reason: format!("Invalid rating '{}'", rating_raw),
            });
        }

        ratings.push(RatingRecord {
            user_id,
            movie_id: parse_movie_id(movie_raw),
            rating,
            timestamp: timestamp_col
                .and_then(|idx| record.get(idx))
                .and_then(|t| t.parse().ok()),
        });
    }

    debug!("Parsed {} ratings from {}", ratings.len(), source);
    Ok(ratings)
}

// =============================================================================
// Movie metadata
// =============================================================================

/// Parse the movie metadata table from disk
pub fn parse_movies(path: &Path) -> Result<Vec<MovieMetadata>> {
    let file = open_file(path)?;
    parse_movies_from_reader(file, &path.display().to_string())
}

/// Parse movie metadata from any reader.
///
/// Rows without a usable id or title are skipped; the source table has a
/// handful of rows whose id column holds a date.
///
/// Only headers are trimmed. Titles are kept exactly as written, since
/// lookups match them exactly; numeric fields are trimmed as they're parsed.
pub fn parse_movies_from_reader<R: Read>(reader: R, source: &str) -> Result<Vec<MovieMetadata>> {
    let mut rdr = csv_reader(reader, Trim::Headers);
    let csv_err = |e: csv::Error| DataLoadError::Csv {
        file: source.to_string(),
        source: e,
    };

    let headers = rdr.headers().map_err(csv_err)?.clone();
    let id_col = column_index(&headers, &["id", "movieId"], source)?;
    let title_col = column_index(&headers, &["title"], source)?;
    let genres_col = optional_column(&headers, "genres");
    let vote_average_col = optional_column(&headers, "vote_average");
    let vote_count_col = optional_column(&headers, "vote_count");

    let mut movies = Vec::new();
    let mut skipped = 0usize;
    let mut record = StringRecord::new();

    while rdr.read_record(&mut record).map_err(csv_err)? {
        let get = |col: Option<usize>| {
            col.and_then(|idx| record.get(idx))
                .filter(|s| !s.trim().is_empty())
        };

        let Some(movie_id) = get(Some(id_col)).and_then(parse_movie_id) else {
            skipped += 1;
            continue;
        };
        let Some(title) = get(Some(title_col)) else {
            skipped += 1;
            continue;
        };

        movies.push(MovieMetadata {
            movie_id,
            title: title.to_string(),
            genres: get(genres_col).map(parse_genres).unwrap_or_default(),
            vote_average: get(vote_average_col).and_then(|v| v.trim().parse().ok()),
            vote_count: get(vote_count_col).and_then(parse_vote_count),
        });
    }

    if skipped > 0 {
        warn!("Skipped {} metadata rows without a valid id or title in {}", skipped, source);
    }
    debug!("Parsed {} movies from {}", movies.len(), source);
    Ok(movies)
}

/// Vote counts are written as floats in the source data ("5415.0")
fn parse_vote_count(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    raw.parse::<u32>().ok().or_else(|| {
        let value = raw.parse::<f64>().ok()?;
        (value.is_finite() && value >= 0.0).then_some(value as u32)
    })
}

// =============================================================================
// Genres
// =============================================================================

#[derive(Debug, Deserialize)]
struct GenreEntry {
    name: String,
}

/// Parse a serialized genre list into genre names.
///
/// Accepts strict JSON (`[{"id": 16, "name": "Animation"}]`) and the
/// single-quoted literal form used by the source dataset
/// (`[{'id': 16, 'name': 'Animation'}]`). Unparsable input yields no genres.
pub fn parse_genres(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let entries = serde_json::from_str::<Vec<GenreEntry>>(text)
        .or_else(|_| serde_json::from_str::<Vec<GenreEntry>>(&requote_literal(text)));

    match entries {
        Ok(entries) => entries.into_iter().map(|g| g.name).collect(),
        Err(e) => {
            debug!("Unparsable genre list {:?}: {}", text, e);
            Vec::new()
        }
    }
}

/// Rewrite a single-quoted literal into JSON.
///
/// Single-quoted strings are re-emitted as JSON strings, double-quoted
/// strings are copied through, and the bare words `None`, `True` and
/// `False` become `null`, `true` and `false`. Nothing is evaluated.
fn requote_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let mut value = String::new();
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        q if q == c => break,
                        other => value.push(other),
                    }
                }
                // serializing a String cannot fail
                out.push_str(&serde_json::to_string(&value).unwrap_or_default());
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !next.is_ascii_alphanumeric() {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                match word.as_str() {
                    "None" => out.push_str("null"),
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    _ => out.push_str(&word),
                }
            }
            other => out.push(other),
        }
    }

    out
}
