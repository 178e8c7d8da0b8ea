use csv_import::{decode_records, DecodeError, Record};
use futures::{StreamExt, TryStreamExt};

async fn decode_all(input: &'static str) -> Result<Vec<Record>, DecodeError> {
    decode_records(input.as_bytes(), "test.csv").try_collect().await
}

#[tokio::test]
async fn decodes_rows_keyed_by_header() -> anyhow::Result<()> {
    let records = decode_all("name,age\nAlice,30\nBob,25\n").await?;

    let expected: Vec<Record> = vec![
        [("name", "Alice"), ("age", "30")].into_iter().collect(),
        [("name", "Bob"), ("age", "25")].into_iter().collect(),
    ];
    assert_eq!(records, expected);
    Ok(())
}

#[tokio::test]
async fn every_record_has_header_width_in_header_order() -> anyhow::Result<()> {
    let mut csv = String::from("sku,title,price,count\n");
    for i in 0..250 {
        csv.push_str(&format!("SKU{i:04},Item {i},{}.99,{}\n", i % 40, i % 7));
    }
    let csv: &'static str = Box::leak(csv.into_boxed_str());

    let records = decode_all(csv).await?;
    assert_eq!(records.len(), 250);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.len(), 4);
        assert_eq!(
            record.columns().collect::<Vec<_>>(),
            ["sku", "title", "price", "count"]
        );
        assert_eq!(record.get("sku"), Some(format!("SKU{i:04}").as_str()));
    }
    Ok(())
}

#[tokio::test]
async fn values_stay_strings() -> anyhow::Result<()> {
    let records = decode_all("title,price,count\n\"Desk, oak\",0012.50,007\n").await?;
    assert_eq!(records[0].get("title"), Some("Desk, oak"));
    assert_eq!(records[0].get("price"), Some("0012.50"));
    assert_eq!(records[0].get("count"), Some("007"));
    Ok(())
}

#[tokio::test]
async fn short_row_stops_the_stream() {
    let mut stream = decode_records(
        &b"name,age\nAlice,30\nBob\nCarol,41\n"[..],
        "uploaded/broken.csv",
    );

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.get("name"), Some("Alice"));

    let err = stream.next().await.unwrap().unwrap_err();
    match &err {
        DecodeError::Csv { label, .. } => assert_eq!(label, "uploaded/broken.csv"),
        other => panic!("unexpected error: {other}"),
    }

    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn long_row_is_a_decode_error() {
    let err = decode_all("a,b\n1,2,3\n").await.unwrap_err();
    assert!(matches!(err, DecodeError::Csv { .. }));
}

#[tokio::test]
async fn invalid_utf8_is_a_decode_error() {
    let err = decode_records(&b"name\n\xff\xfe\n"[..], "bin.csv")
        .try_collect::<Vec<_>>()
        .await
        .unwrap_err();
    assert!(matches!(err, DecodeError::Csv { .. }));
}

#[tokio::test]
async fn empty_input_and_header_only_yield_nothing() -> anyhow::Result<()> {
    assert!(decode_all("").await?.is_empty());
    assert!(decode_all("name,age\n").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn blank_lines_and_missing_final_newline_are_tolerated() -> anyhow::Result<()> {
    let records = decode_all("name,age\r\n\r\nAlice,30\r\nBob,25").await?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].get("age"), Some("25"));
    Ok(())
}
