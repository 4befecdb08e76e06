use bytes::{Bytes, BytesMut};
use criterion::{Criterion, criterion_group, criterion_main};
use cornercut_http::codec::{RequestDecoder, ResponseEncoder};
use http::{Response, StatusCode};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

fn bench_request_decoder(c: &mut Criterion) {
    let request = b"GET /sum?op=add HTTP/1.1\r\nHost: localhost\r\nAccept: */*\r\n\r\n";

    c.bench_function("decode_simple_request", |b| {
        b.iter(|| {
            let mut decoder = RequestDecoder::new();
            let mut bytes = BytesMut::from(&request[..]);
            black_box(decoder.decode(&mut bytes).unwrap());
        });
    });

    let request = b"POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 11\r\n\r\nhello world";

    c.bench_function("decode_request_with_body", |b| {
        b.iter(|| {
            let mut decoder = RequestDecoder::new();
            let mut bytes = BytesMut::from(&request[..]);
            black_box(decoder.decode(&mut bytes).unwrap());
        });
    });
}

fn bench_response_encoder(c: &mut Criterion) {
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "text/html")
        .body(Bytes::from_static(b"Hello World!"))
        .unwrap();

    c.bench_function("encode_simple_response", |b| {
        b.iter(|| {
            let mut encoder = ResponseEncoder::new();
            let mut bytes = BytesMut::new();
            encoder.encode(response.clone(), &mut bytes).unwrap();
            black_box(bytes);
        });
    });
}

criterion_group!(benches, bench_request_decoder, bench_response_encoder);
criterion_main!(benches);
