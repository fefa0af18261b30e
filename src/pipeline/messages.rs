//! User-facing replies

pub const RECOGNIZING: &str = "Слышу. Распознаю речь…";
pub const TRANSLATING: &str = "Перевожу по словарю…";
pub const VOICING: &str = "Озвучиваю…";

pub const BUSY: &str =
    "Сейчас обрабатываю другое сообщение. Пожалуйста, попробуйте ещё раз через минуту.";
pub const BUSY_VOICEOVER: &str =
    "(Озвучка: бот сейчас занят другим сообщением, попробуйте ещё раз через минуту.)";

pub const NOT_RECOGNIZED: &str =
    "Не удалось распознать речь. Попробуй говорить чуть громче/чище.";

pub const CANNOT_TRANSLATE_VOICE: &str = "Не получилось перевести на Джангалогу: в распознанном тексте не нашлось слов из словаря.\nПопробуйте переформулировать.";
pub const CANNOT_TRANSLATE_TEXT: &str = "Не получилось перевести на Джангалогу: в тексте не нашлось слов из словаря.\nПопробуйте переформулировать.";

pub const AUDIO_FAILED: &str = "Перевод готов, но озвучку отправить не удалось (ошибка синтеза или загрузки голосового сообщения).\nПопробуйте ещё раз чуть позже.";

pub const PROCESSING_FAILED: &str =
    "Не удалось обработать сообщение. Попробуйте ещё раз чуть позже.";

pub const VOICE_UNSUPPORTED: &str =
    "Голосовые сообщения сейчас не поддерживаются: не найден аудиоконвертер. Отправьте текст.";

pub const HELP: &str = "Привет, друг, или как говорят у нас: 'Монони губожя'. Я гунажий бот для перевода твоего текста (или голосовухи) с русского на мой язык Джангалогу.\n\nОтправь voice или текст — и получи перевод + озвучку.";

pub fn missing_speaker(path: &std::path::Path) -> String {
    format!(
        "Не найден референс-голос: {}. Добавьте wav-файл и перезапустите бота.",
        path.display()
    )
}

pub fn voice_too_long(seconds: u32, limit: u32) -> String {
    format!(
        "Сообщение слишком длинное для обработки: {} сек.\nПожалуйста, сократите до {} сек или меньше.",
        seconds, limit
    )
}

pub fn text_too_long(chars: usize, limit: usize) -> String {
    format!(
        "Текст слишком длинный для обработки ({} символов).\nПожалуйста, сократите до {} символов или меньше.",
        chars, limit
    )
}

pub fn recognized_too_long(chars: usize, limit: usize) -> String {
    format!(
        "Распознанный текст слишком длинный для обработки ({} символов).\nПожалуйста, сократите сообщение до {} символов или меньше.",
        chars, limit
    )
}

pub fn busy_with_translation(translation: &str) -> String {
    format!("{}\n\n{}", translation, BUSY_VOICEOVER)
}
