//! Fixed user-facing texts and the assistant persona.

pub const ASSISTANT_NAME: &str = "AI-Kinochi";

pub const SYSTEM_PROMPT: &str = "Siz AI-Kinochi, UZHD Kinolari kanalining rasmiy kino maslahatchisisiz. \
Foydalanuvchi bilan o'zbek tilida, samimiy va qisqa gaplashing. \
Kayfiyat, janr, aktyor yoki avval ko'rilgan filmlarga qarab 3-5 ta film tavsiya qiling; \
har biri uchun nomi, yili, janri va bir jumlalik mazmunini yozing. \
Syujetning muhim burilishlarini oshkor qilmang. \
Kino va seriallarga aloqasi bo'lmagan savollarga muloyimlik bilan kino mavzusiga qaytaring.";

pub const INITIAL_MESSAGE: &str = "Assalomu alaykum! Men AI-Kinochiman. \
Qanday kayfiyatdasiz yoki qaysi janrni xohlaysiz? Sizga mos filmlarni topib beraman.";

/// Returned by a non-streaming turn when the backend produced no text.
pub const NO_ANSWER_TEXT: &str = "Uzr, javob topa olmadim.";

pub const BACKEND_ERROR_TEXT: &str =
    "Kechirasiz, texnik nosozlik yuz berdi. Iltimos, keyinroq urinib ko'ring.";

pub const STREAMING_ERROR_TEXT: &str = "Kechirasiz, oqimli javobda xatolik yuz berdi.";

/// Shown when a failure carries no text of its own.
pub const GENERIC_ERROR_TEXT: &str = "Xatolik yuz berdi.";
