use wicket::http::parser::{ParseError, Progress};
use wicket::http::request::{Method, Request};
use wicket::http::response::StatusCode;

/// Everything observable about a parsed request.
#[derive(Debug, PartialEq)]
struct Outcome {
    result: Result<Progress, ParseError>,
    method: Option<Method>,
    path: Option<Vec<u8>>,
    content_length: Option<u64>,
    header_end: Option<usize>,
    body: Option<Vec<u8>>,
    complete: Option<bool>,
}

fn outcome(req: &Request, result: Result<Progress, ParseError>) -> Outcome {
    Outcome {
        // completion is only meaningful when the last call succeeded
        complete: result.is_ok().then(|| req.is_complete()),
        result,
        method: req.method(),
        path: req.path().map(<[u8]>::to_vec),
        content_length: req.content_length(),
        header_end: req.header_end(),
        body: req.body().map(<[u8]>::to_vec),
    }
}

fn parse_whole(bytes: &[u8]) -> Outcome {
    let mut req = Request::from_bytes(bytes).unwrap();
    let result = req.parse();
    outcome(&req, result)
}

fn parse_chunks(chunks: &[&[u8]]) -> Outcome {
    let mut req = Request::from_bytes(b"").unwrap();
    let mut result = req.parse();
    for chunk in chunks {
        req.buffer_mut().append(chunk).unwrap();
        result = req.parse();
    }
    outcome(&req, result)
}

const SAMPLES: [&[u8]; 8] = [
    b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\n\r\n",
    b"POST /form HTTP/1.1\r\nHost: x\r\nContent-Length: 11\r\n\r\nhello world",
    b"POST /form HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcd",
    b"POST /form HTTP/1.1\r\nHost: x\r\n\r\n",
    b"POST /form HTTP/1.1\r\nContent-Length: 1x\r\n\r\n",
    b"FOO / HTTP/1.1\r\n\r\n",
    b"DELETE /old HTTP/1.1\r\nContent-Length: 2\r\n\r\n",
    b"GET /a HTTP/1.1\r\nX: y\rZ\r\n\r\n",
];

#[test]
fn test_parse_simple_get_request() {
    let mut req = Request::from_bytes(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();

    assert_eq!(req.parse(), Ok(Progress::Parsed));
    assert!(req.is_complete());
    assert_eq!(req.method(), Some(Method::GET));
    assert_eq!(req.path_str(), Some("/"));
    assert_eq!(req.content_length(), None);
}

#[test]
fn test_get_completes_exactly_at_final_byte() {
    let full = b"GET /x HTTP/1.1\r\n\r\n";

    for end in 0..full.len() {
        let mut req = Request::from_bytes(&full[..end]).unwrap();
        assert_eq!(req.parse(), Ok(Progress::Incomplete), "prefix of {end} bytes");
        assert!(!req.is_complete(), "prefix of {end} bytes");
    }

    let mut req = Request::from_bytes(full).unwrap();
    assert_eq!(req.parse(), Ok(Progress::Parsed));
    assert!(req.is_complete());
    assert_eq!(req.header_end(), Some(full.len()));
}

#[test]
fn test_post_body_must_match_content_length() {
    let head = b"POST /submit HTTP/1.1\r\nContent-Length: 5\r\n\r\n";
    let mut req = Request::from_bytes(head).unwrap();
    assert_eq!(req.parse(), Ok(Progress::Incomplete));

    for byte in b"1234" {
        req.buffer_mut().append(&[*byte]).unwrap();
        assert_eq!(req.parse(), Ok(Progress::Incomplete));
        assert!(!req.is_complete());
    }

    req.buffer_mut().append(b"5").unwrap();
    assert_eq!(req.parse(), Ok(Progress::Parsed));
    assert!(req.is_complete());
    assert_eq!(req.body(), Some(&b"12345"[..]));

    req.buffer_mut().append(b"6").unwrap();
    let err = req.parse().unwrap_err();
    assert_eq!(err, ParseError::BodyTooLong { expected: 5, received: 6 });
    assert_eq!(err.status(), StatusCode::BadRequest);
}

#[test]
fn test_post_without_content_length_requires_length() {
    let mut req = Request::from_bytes(b"POST /submit HTTP/1.1\r\nHost: x\r\n").unwrap();
    assert_eq!(req.parse(), Ok(Progress::Incomplete));

    req.buffer_mut().append(b"\r\n").unwrap();
    let err = req.parse().unwrap_err();
    assert_eq!(err, ParseError::LengthRequired);
    assert_eq!(err.status(), StatusCode::LengthRequired);
}

#[test]
fn test_post_with_zero_content_length_requires_length() {
    let mut req =
        Request::from_bytes(b"POST /submit HTTP/1.1\r\nContent-Length: 0\r\n\r\n").unwrap();
    assert_eq!(req.parse(), Err(ParseError::LengthRequired));
    assert_eq!(req.content_length(), Some(0));
}

#[test]
fn test_content_length_match_is_case_sensitive() {
    let mut req = Request::from_bytes(b"POST / HTTP/1.1\r\ncontent-length: 3\r\n\r\nabc").unwrap();
    assert_eq!(req.parse(), Err(ParseError::LengthRequired));
}

#[test]
fn test_parse_invalid_http_method() {
    let mut req = Request::from_bytes(b"FOO / HTTP/1.1\r\n\r\n").unwrap();
    let err = req.parse().unwrap_err();

    assert_eq!(err, ParseError::InvalidMethod);
    assert_eq!(err.status(), StatusCode::BadRequest);
}

#[test]
fn test_method_waits_for_enough_bytes() {
    for prefix in [&b""[..], b"G", b"GE", b"GET", b"PO", b"DELE", b"DELET", b"TRAC", b"OPTIONS"] {
        let mut req = Request::from_bytes(prefix).unwrap();
        assert_eq!(req.parse(), Ok(Progress::Incomplete), "{:?}", prefix);
        assert_eq!(req.method(), None);
    }

    for prefix in [&b"GEX"[..], b"DELEX", b"TRACX", b"OPTIONSX", b"get "] {
        let mut req = Request::from_bytes(prefix).unwrap();
        assert_eq!(req.parse(), Err(ParseError::InvalidMethod), "{:?}", prefix);
    }
}

#[test]
fn test_parse_various_http_methods() {
    let methods = vec![
        ("GET", Method::GET),
        ("PUT", Method::PUT),
        ("POST", Method::POST),
        ("HEAD", Method::HEAD),
        ("DELETE", Method::DELETE),
        ("OPTIONS", Method::OPTIONS),
        ("TRACE", Method::TRACE),
    ];

    for (method_str, expected_method) in methods {
        let raw = format!("{} / HTTP/1.1\r\nContent-Length: 1\r\n\r\nx", method_str);
        let mut req = Request::from_bytes(raw.as_bytes()).unwrap();
        assert_eq!(req.parse(), Ok(Progress::Parsed), "{method_str}");
        assert_eq!(req.method(), Some(expected_method));
        assert_eq!(req.path_str(), Some("/"));
    }
}

#[test]
fn test_non_post_methods_complete_at_header_end() {
    let mut req = Request::from_bytes(b"PUT /f HTTP/1.1\r\nContent-Length: 10\r\n\r\n").unwrap();

    assert_eq!(req.parse(), Ok(Progress::Parsed));
    assert!(req.is_complete());
    assert_eq!(req.content_length(), Some(10));
}

#[test]
fn test_method_must_be_followed_by_space() {
    let mut req = Request::from_bytes(b"POSTX / HTTP/1.1\r\n\r\n").unwrap();
    assert_eq!(req.parse(), Err(ParseError::InvalidPath));
}

#[test]
fn test_parse_request_with_path_and_query_string() {
    let mut req = Request::from_bytes(b"GET /search?q=rust HTTP/1.1\r\n\r\n").unwrap();
    req.parse().unwrap();

    assert_eq!(req.path_str(), Some("/search?q=rust"));
}

#[test]
fn test_path_rejects_non_printable_bytes() {
    let mut req = Request::from_bytes(b"GET /a\x01b HTTP/1.1\r\n\r\n").unwrap();
    assert_eq!(req.parse(), Err(ParseError::InvalidPath));

    let mut req = Request::from_bytes(b"GET /caf\xc3\xa9 HTTP/1.1\r\n\r\n").unwrap();
    assert_eq!(req.parse(), Err(ParseError::InvalidPath));

    let mut req = Request::from_bytes(b"GET  / HTTP/1.1\r\n\r\n").unwrap();
    assert_eq!(req.parse(), Err(ParseError::InvalidPath));
}

#[test]
fn test_path_waits_for_closing_space() {
    let mut req = Request::from_bytes(b"GET /long/path/without/end").unwrap();
    assert_eq!(req.parse(), Ok(Progress::Incomplete));
    assert_eq!(req.method(), Some(Method::GET));
    assert_eq!(req.path(), None);

    req.buffer_mut().append(b" HTTP/1.1\r\n\r\n").unwrap();
    assert_eq!(req.parse(), Ok(Progress::Parsed));
    assert_eq!(req.path_str(), Some("/long/path/without/end"));
}

#[test]
fn test_malformed_content_length_headers() {
    let cases: [&[u8]; 5] = [
        b"POST / HTTP/1.1\r\nContent-Length:5\r\n\r\n",
        b"POST / HTTP/1.1\r\nContent-Length:  5\r\n\r\n",
        b"POST / HTTP/1.1\r\nContent-Length: 5 \r\n\r\n",
        b"POST / HTTP/1.1\r\nContent-Length: \r\n\r\n",
        b"POST / HTTP/1.1\r\nContent-Length: -5\r\n\r\n",
    ];

    for raw in cases {
        let mut req = Request::from_bytes(raw).unwrap();
        assert_eq!(
            req.parse(),
            Err(ParseError::InvalidContentLength),
            "{}",
            String::from_utf8_lossy(raw)
        );
    }
}

#[test]
fn test_last_content_length_wins() {
    let mut req = Request::from_bytes(
        b"POST / HTTP/1.1\r\nContent-Length: 9\r\nContent-Length: 2\r\n\r\nok",
    )
    .unwrap();

    assert_eq!(req.parse(), Ok(Progress::Parsed));
    assert_eq!(req.content_length(), Some(2));
    assert_eq!(req.body(), Some(&b"ok"[..]));
}

#[test]
fn test_bare_carriage_return_is_rejected() {
    let mut req = Request::from_bytes(b"GET / HTTP/1.1\rX\r\n\r\n").unwrap();
    assert_eq!(req.parse(), Err(ParseError::InvalidLineEnding));
}

#[test]
fn test_incomplete_after_completion_clears_flag() {
    let mut req = Request::from_bytes(b"GET / HTTP/1.1\r\nHost: exa").unwrap();
    req.buffer_mut().mark_complete();

    assert_eq!(req.parse(), Ok(Progress::Parsed));
    assert!(!req.is_complete());

    assert_eq!(req.parse(), Ok(Progress::Incomplete));
}

#[test]
fn test_repeated_parse_is_stable() {
    let mut req = Request::from_bytes(SAMPLES[1]).unwrap();

    assert_eq!(req.parse(), Ok(Progress::Parsed));
    assert_eq!(req.parse(), Ok(Progress::Parsed));
    assert!(req.is_complete());
    assert_eq!(req.body(), Some(&b"hello world"[..]));
}

#[test]
fn test_every_two_way_split_matches_whole_parse() {
    for sample in SAMPLES {
        let whole = parse_whole(sample);
        for split in 0..=sample.len() {
            let (a, b) = sample.split_at(split);
            assert_eq!(
                parse_chunks(&[a, b]),
                whole,
                "{} split at {split}",
                String::from_utf8_lossy(sample)
            );
        }
    }
}

#[test]
fn test_byte_at_a_time_matches_whole_parse() {
    for sample in SAMPLES {
        let chunks: Vec<&[u8]> = sample.chunks(1).collect();
        assert_eq!(parse_chunks(&chunks), parse_whole(sample));
    }
}

#[test]
fn test_random_splits_match_whole_parse() {
    let mut rng = fastrand::Rng::with_seed(0x9e37_79b9);

    for sample in SAMPLES {
        let whole = parse_whole(sample);
        for _ in 0..50 {
            let mut chunks = Vec::new();
            let mut rest = sample;
            while !rest.is_empty() {
                let n = rng.usize(0..7).min(rest.len());
                let (chunk, tail) = rest.split_at(n);
                chunks.push(chunk);
                rest = tail;
            }
            assert_eq!(parse_chunks(&chunks), whole);
        }
    }
}
