use super::core::*;

fn record_with(key: &[u8; KEY_SIZE], payload: u8) -> Record {
    let mut data = [payload; RECORD_SIZE];
    data[..KEY_SIZE].copy_from_slice(key);
    Record(data)
}

#[test]
fn test_key_comparison_is_unsigned_bytewise() {
    // 0x80 must sort after 0x7F (unsigned), not before (signed)
    let low = Key(*b"\x7F\0\0\0\0\0\0\0\0\0");
    let high = Key(*b"\x80\0\0\0\0\0\0\0\0\0");
    assert!(low < high);

    let a = Key(*b"AAAAAAAAAA");
    let b = Key(*b"AAAAAAAAAB");
    assert!(a < b);
    assert_eq!(a, a);
}

#[test]
fn test_record_comparison_ignores_payload() {
    let a = record_with(b"SAMEKEY\0\0\0", 0x00);
    let b = record_with(b"SAMEKEY\0\0\0", 0xFF);
    assert_eq!(a, b);
    assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
}

#[test]
fn test_record_comparison_never_reads_past_the_key() {
    // Keys equal through all 10 bytes; the payload byte right after the
    // key differs in a way that would flip the order if it leaked in.
    let mut lo = record_with(b"KKKKKKKKKK", 0);
    let mut hi = record_with(b"KKKKKKKKKK", 0);
    lo.0[KEY_SIZE] = 0xFF;
    hi.0[KEY_SIZE] = 0x00;
    assert_eq!(lo.cmp(&hi), std::cmp::Ordering::Equal);
}

#[test]
fn test_radix_byte_walks_the_key() {
    let r = record_with(b"\x01\x02\x03\x04\x05\x06\x07\x08\x09\x0A", 0xEE);
    for level in 0..KEY_SIZE {
        assert_eq!(r.radix_byte(level), level + 1);
    }
}

#[test]
fn test_to_key_copies_leading_bytes() {
    let r = record_with(b"0123456789", 0x55);
    assert_eq!(&r.to_key().0, b"0123456789");
}

#[test]
fn test_byte_casts_round_trip() {
    let mut bytes = vec![0u8; 3 * RECORD_SIZE];
    bytes[0] = 7;
    bytes[RECORD_SIZE] = 9;

    {
        let records = records_from_bytes_mut(&mut bytes);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].0[0], 7);
        assert_eq!(records[1].0[0], 9);
        records[2].0[0] = 4;
    }
    assert_eq!(bytes[2 * RECORD_SIZE], 4);

    let records = records_from_bytes(&bytes);
    assert_eq!(records_as_bytes(records), &bytes[..]);
}

#[test]
#[should_panic(expected = "not a multiple")]
fn test_misaligned_cast_panics() {
    let bytes = vec![0u8; RECORD_SIZE + 1];
    let _ = records_from_bytes(&bytes);
}

#[test]
fn test_partition_index_against_thresholds() {
    let t = |b: u8| {
        let mut k = [0u8; KEY_SIZE];
        k[0] = b;
        Key(k)
    };
    // 4 partitions need 3 thresholds
    let thresholds = vec![t(10), t(20), t(30)];

    assert_eq!(partition_index(&t(0), &thresholds), 0);
    assert_eq!(partition_index(&t(9), &thresholds), 0);
    // A key equal to a threshold belongs to the partition above it
    assert_eq!(partition_index(&t(10), &thresholds), 1);
    assert_eq!(partition_index(&t(19), &thresholds), 1);
    assert_eq!(partition_index(&t(25), &thresholds), 2);
    assert_eq!(partition_index(&t(30), &thresholds), 3);
    assert_eq!(partition_index(&t(255), &thresholds), 3);
}

#[test]
fn test_partition_index_with_no_thresholds() {
    let k = Key([0u8; KEY_SIZE]);
    assert_eq!(partition_index(&k, &[]), 0);
}
