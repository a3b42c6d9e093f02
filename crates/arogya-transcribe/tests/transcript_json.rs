use arogya_core::models::intake::Locale;
use arogya_transcribe::{MediaFormat, extract_transcript_text, language_code, media_format_for_extension};
use aws_sdk_transcribe::types::LanguageCode;

#[test]
fn extracts_first_transcript() {
    let json = r#"{"jobName": "arogya-1", "results": {"transcripts": [{"transcript": " mujhe bukhar hai "}], "items": []}}"#;
    assert_eq!(extract_transcript_text(json).unwrap(), "mujhe bukhar hai");
}

#[test]
fn missing_transcripts_mean_no_speech() {
    let json = r#"{"results": {"transcripts": []}}"#;
    assert_eq!(extract_transcript_text(json).unwrap(), "");
}

#[test]
fn invalid_json_is_a_parse_error() {
    assert!(extract_transcript_text("not json").is_err());
}

#[test]
fn locale_selects_indian_language_codes() {
    assert_eq!(language_code(Locale::Local), LanguageCode::HiIn);
    assert_eq!(language_code(Locale::Default), LanguageCode::EnIn);
}

#[test]
fn media_formats_by_extension() {
    assert_eq!(media_format_for_extension("WAV"), Some(MediaFormat::Wav));
    assert_eq!(media_format_for_extension("m4a"), Some(MediaFormat::Mp4));
    assert_eq!(media_format_for_extension("txt"), None);
}
