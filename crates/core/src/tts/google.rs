use crate::tts::{TtsAudio, TtsClient, TtsError, TtsRequest};
use bytes::BytesMut;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use url::Url;

/// The endpoint rejects longer `q` values.
pub const MAX_CHUNK_CHARS: usize = 100;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Client for the Google Translate text-to-speech endpoint.
#[derive(Clone)]
pub struct GoogleTtsClient {
    client: Client,
    endpoint: Url,
}

impl GoogleTtsClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }
}

/// Packs words into chunks of at most `max_chars` characters. A single word
/// longer than that is cut at character boundaries.
pub(crate) fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            chunks.push(std::mem::replace(&mut current, word.to_owned()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn chunk_query(lang: &str, chunk: &str, idx: usize, total: usize) -> Vec<(&'static str, String)> {
    vec![
        ("ie", "UTF-8".to_owned()),
        ("client", "tw-ob".to_owned()),
        ("tl", lang.to_owned()),
        ("q", chunk.to_owned()),
        ("total", total.to_string()),
        ("idx", idx.to_string()),
        ("textlen", chunk.chars().count().to_string()),
    ]
}

impl TtsClient for GoogleTtsClient {
    fn synthesize(&self, request: TtsRequest) -> BoxFuture<'_, Result<TtsAudio, TtsError>> {
        async move {
            let chunks = split_text(&request.text, MAX_CHUNK_CHARS);
            if chunks.is_empty() {
                return Err(TtsError::EmptyText);
            }

            let total = chunks.len();
            let mut mp3 = BytesMut::new();

            for (idx, chunk) in chunks.iter().enumerate() {
                tracing::debug!(idx, total, chars = chunk.chars().count(), "requesting tts chunk");

                let response = self
                    .client
                    .get(self.endpoint.clone())
                    .header(USER_AGENT, BROWSER_USER_AGENT)
                    .query(&chunk_query(request.lang.as_str(), chunk, idx, total))
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let status = response.status();
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(TtsError::HttpStatus(status.as_u16(), error_text));
                }

                mp3.extend_from_slice(&response.bytes().await?);
            }

            Ok(TtsAudio { mp3: mp3.freeze() })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LangCode;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(
            split_text("  Hello,   how are you?  ", MAX_CHUNK_CHARS),
            vec!["Hello, how are you?".to_owned()]
        );
    }

    #[test]
    fn chunks_break_on_word_boundaries() {
        let chunks = split_text("one two three four", 9);
        assert_eq!(chunks, vec!["one two", "three", "four"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 9));
    }

    #[test]
    fn overlong_word_is_hard_split() {
        let chunks = split_text("hi abcdefghij ok", 4);
        assert_eq!(chunks, vec!["hi", "abcd", "efgh", "ij", "ok"]);
    }

    #[test]
    fn multibyte_text_is_counted_in_chars() {
        let chunks = split_text("ééé ééé", 7);
        assert_eq!(chunks, vec!["ééé ééé"]);
    }

    #[test]
    fn blank_text_yields_no_chunks() {
        assert!(split_text(" \n\t ", MAX_CHUNK_CHARS).is_empty());
    }

    #[test]
    fn query_carries_language_and_position() {
        let q = chunk_query("en", "hello there", 1, 3);
        assert!(q.contains(&("tl", "en".to_owned())));
        assert!(q.contains(&("q", "hello there".to_owned())));
        assert!(q.contains(&("idx", "1".to_owned())));
        assert!(q.contains(&("total", "3".to_owned())));
        assert!(q.contains(&("textlen", "11".to_owned())));
    }

    #[tokio::test]
    async fn empty_request_fails_before_any_network_call() {
        let client = GoogleTtsClient::new(Url::parse("http://127.0.0.1:9/unused").unwrap());
        let err = client
            .synthesize(TtsRequest {
                text: "   ".into(),
                lang: LangCode::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::EmptyText));
    }
}
