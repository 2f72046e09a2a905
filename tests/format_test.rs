use basic::lang::{convert, decode, encode, EncodedBlob, ErrorCode, Format, ProgramImage};
use rand::seq::SliceRandom;
use rand::Rng;

const TEXT: &[u8] = b"10 PRINT 1\r\n\x1a";
const TOKENISED: &[u8] = b"\xff\x76\x12\x0a\x00\x91\x20\x12\x00\x00\x00\x1a";
const PROTECTED: &[u8] = b"\xfe\xe9\xa9\xbf\x54\xe2\x12\xad\xf1\x89\xf9\x1a";
const RESAVED: &[u8] = b"\xfe\xe9\xa9\xbf\x54\xe2\x12\xad\xf1\x89\xf9\x73\x1a";

fn blob(bytes: &[u8]) -> EncodedBlob {
    EncodedBlob::from_bytes(bytes.to_vec()).unwrap()
}

#[test]
fn test_text_to_tokenised() {
    let out = convert(&blob(TEXT), Format::Tokenised).unwrap();
    assert_eq!(out.as_bytes(), TOKENISED);
}

#[test]
fn test_text_to_protected() {
    let out = convert(&blob(TEXT), Format::Protected).unwrap();
    assert_eq!(out.as_bytes(), PROTECTED);
}

#[test]
fn test_protected_to_tokenised() {
    let out = convert(&blob(PROTECTED), Format::Tokenised).unwrap();
    assert_eq!(out.as_bytes(), TOKENISED);
}

#[test]
fn test_tokenised_to_protected_keeps_sentinel() {
    let out = convert(&blob(TOKENISED), Format::Protected).unwrap();
    assert_eq!(out.as_bytes(), RESAVED);
    assert_eq!(decode(&out).unwrap(), decode(&blob(TEXT)).unwrap());
}

#[test]
fn test_binary_to_text() {
    for bytes in &[TOKENISED, PROTECTED, RESAVED] {
        let out = convert(&blob(bytes), Format::PlainText).unwrap();
        assert_eq!(out.as_bytes(), b"10 PRINT 1\r\n\x1a");
    }
}

#[test]
fn test_question_mark_is_print() {
    let out = convert(&blob(b"10 ? 1\r\n\x1a"), Format::Tokenised).unwrap();
    assert_eq!(out.as_bytes(), TOKENISED);
}

#[test]
fn test_unknown_marker() {
    for bytes in &[&b"\xfd\x00\x00"[..], &b"\x80"[..], &b"\xfc\x1a"[..]] {
        let error = EncodedBlob::from_bytes(bytes.to_vec()).unwrap_err();
        assert_eq!(error.code(), ErrorCode::UnknownMarker);
    }
}

#[test]
fn test_truncated_binaries() {
    for len in 1..TOKENISED.len() - 2 {
        let error = decode(&blob(&TOKENISED[..len])).unwrap_err();
        assert_eq!(error.code(), ErrorCode::CorruptTokenised);
    }
    for len in 1..PROTECTED.len() - 2 {
        let error = decode(&blob(&PROTECTED[..len])).unwrap_err();
        assert_eq!(error.code(), ErrorCode::CorruptProtected);
    }
}

#[test]
fn test_program_listing() {
    let text = b"30 DATA 1,\"two:three\",four\r\n\
                 10 FOR I=1 TO 10:PRINT I;:NEXT I\r\n\
                 20 IF I>5 THEN 40 ELSE 10\r\n\
                 40 A$=LEFT$(B$,3)+CHR$(13):' done\r\n\
                 50 WHILE X:WEND\r\n\x1a";
    let image = decode(&blob(text)).unwrap();
    assert_eq!(image.len(), 5);
    let listed = encode(&image, Format::PlainText);
    assert!(listed.as_bytes().starts_with(b"10 FOR I=1 TO 10:PRINT I;:NEXT I\r\n"));
    assert_eq!(decode(&listed).unwrap(), image);
    for format in &[Format::Tokenised, Format::Protected] {
        let binary = encode(&image, *format);
        assert_eq!(binary.format(), *format);
        assert_eq!(decode(&binary).unwrap(), image);
        let again = convert(&binary, Format::PlainText).unwrap();
        assert_eq!(again.as_bytes(), listed.as_bytes());
    }
}

#[test]
fn test_direct_statement_in_file() {
    let error = decode(&blob(b"10 PRINT\r\nPRINT 2\r\n")).unwrap_err();
    assert_eq!(error.code(), ErrorCode::DirectStatementInFile);
    assert!(error.to_string().contains("In line 2 of the file"));
}

#[test]
fn test_empty_program() {
    let empty = ProgramImage::new();
    for format in &[Format::PlainText, Format::Tokenised, Format::Protected] {
        let out = encode(&empty, *format);
        assert_eq!(out.as_bytes().last(), Some(&0x1A));
        assert_eq!(decode(&out).unwrap(), empty);
    }
}

fn random_statement<R: Rng>(rng: &mut R) -> Vec<u8> {
    let names = ["A", "B%", "C$", "D#", "TOTAL", "X1"];
    let words = ["HELLO", "a:b", "1,2", "GOTO", "REM"];
    let stray = [0x00, 0x0B, 0x0E, 0x0F, 0x1C, 0x1D, 0x1F, 0x84, 0x8F, 0xFD, 0xFF];
    let name = names.choose(rng).unwrap();
    let word = words.choose(rng).unwrap();
    let b = *stray.choose(rng).unwrap();
    match rng.gen_range(0..13) {
        0 => format!("PRINT {}", rng.gen_range(0..40000)).into_bytes(),
        1 => format!("GOTO {}", rng.gen_range(0..65530)).into_bytes(),
        2 => format!("{}=\"{}\"", name, word).into_bytes(),
        3 => format!("REM {}", word).into_bytes(),
        4 => format!("X={}.{}", rng.gen_range(0..1000), rng.gen_range(0..1000)).into_bytes(),
        5 => format!(
            "IF {} THEN {} ELSE {}",
            name,
            rng.gen_range(0..1000),
            rng.gen_range(0..1000)
        )
        .into_bytes(),
        6 => format!("DATA {},{}", word, rng.gen_range(0..300)).into_bytes(),
        7 => format!("' {}", word).into_bytes(),
        8 => format!("FOR I={} TO &H{:X}", rng.gen_range(0..10), rng.gen::<u16>()).into_bytes(),
        9 => {
            let mut s = b"PRINT \"A".to_vec();
            s.push(b);
            s.extend_from_slice(b"B\"");
            s
        }
        10 => vec![b'A', b'=', b, b'1'],
        11 => vec![b'R', b'E', b'M', b' ', b, b],
        _ => format!("{}={}#", name, rng.gen::<f64>()).into_bytes(),
    }
}

#[test]
fn test_random_programs_survive_binary_formats() {
    let mut rng = rand::thread_rng();
    for _ in 0..50 {
        let mut text = vec![];
        for _ in 0..rng.gen_range(0..20) {
            let statements: Vec<Vec<u8>> = (0..rng.gen_range(1..4))
                .map(|_| random_statement(&mut rng))
                .collect();
            text.extend(format!("{} ", rng.gen_range(0..65530)).into_bytes());
            text.extend(statements.join(&b':'));
            text.extend_from_slice(b"\r\n");
        }
        let image = decode(&EncodedBlob::PlainText(text)).unwrap();
        for format in &[Format::Tokenised, Format::Protected] {
            let binary = encode(&image, *format);
            assert_eq!(decode(&binary).unwrap(), image);
            let through = convert(&binary, Format::Tokenised).unwrap();
            assert_eq!(decode(&through).unwrap(), image);
        }
    }
}

#[test]
fn test_stray_bytes_survive_binary_formats() {
    let text = b"10 PRINT \"A\x00B\"\r\n20 A=\x1c\r\n30 REM \x00\xff\r\n40 END\r\n";
    let image = decode(&blob(text)).unwrap();
    assert_eq!(image.len(), 4);
    for format in &[Format::Tokenised, Format::Protected] {
        let binary = encode(&image, *format);
        assert_eq!(decode(&binary).unwrap(), image);
    }
}
