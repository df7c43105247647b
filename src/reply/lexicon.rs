//! Static phrase and keyword data for the offline reply engine.
//!
//! Kept apart from the matching logic so the word lists can be localized
//! without touching code. Everything here is lowercase; callers lowercase
//! the input before matching.

// --- Safety screen ---

/// Profanity and insults that trigger de-escalation (substring match).
pub(super) const DENYLIST: &[&str] = &[
    "đồ ngu", "ngu vãi", "óc chó", "cút", "địt", "đmm", "dm", "đm", "fuck", "cặc", "lồn",
];

pub(super) const DEESCALATE_BODY: &str = "Mình không chửi lại đâu. Nếu bạn muốn mình giúp, \
     nói rõ vấn đề + mục tiêu, mình xử lý cho nhanh.";

// --- FAQ (regex pattern, canned answer), first match wins ---

pub(super) const FAQ: &[(&str, &str)] = &[
    (
        r"\bhello\b|\bhi\b|\bchào\b|\bxin chào\b",
        "Chào bạn. Bạn cần mình làm gì?",
    ),
    (
        r"\bcảm ơn\b|\bthanks\b|\bthank you\b",
        "Ok. Có gì cứ nói tiếp.",
    ),
    (
        r"\blỗi\b|\berror\b|\bbug\b|\bfix\b|\bsửa\b",
        "Bạn gửi 3–5 dòng cuối log + bạn đang làm tới bước nào, mình chỉ đúng chỗ sửa.",
    ),
];

// --- Intent keywords (substring match) ---

/// "what / why / how / guide".
pub(super) const QUESTION_KW: &[&str] =
    &["là gì", "sao", "tại sao", "cách", "làm thế nào", "hướng dẫn"];

/// "help / fix / bug / setup / install / run".
pub(super) const HELP_KW: &[&str] =
    &["giúp", "hỗ trợ", "fix", "sửa", "lỗi", "cài", "chạy", "setup"];

/// "sad / tired / stressed / bored / worried / anxious".
pub(super) const EMOTION_KW: &[&str] = &["buồn", "mệt", "stress", "chán", "lo", "sợ", "căng"];

pub(super) const GREETING_KW: &[&str] = &["hello", "hi", "chào", "xin chào"];

// --- Reply bodies ---

pub(super) const CLARIFY_BODY: &str =
    "Bạn nói rõ hơn 1 chút: bạn đang muốn hỏi gì, hay muốn mình làm gì?";

pub(super) const EMOTION_BODY: &str = "Mình hỏi 3 cái thôi: (1) chuyện gì xảy ra? \
     (2) bạn đang cần gì ngay bây giờ? (3) có ràng buộc nào không?";

pub(super) const HELP_CHECKLIST: &str = "Ok, mình xử lý theo checklist: \
     1) Bạn đang dùng môi trường nào (Android/Pydroid/VPS)? \
     2) Bạn làm tới bước nào? \
     3) Dán 3–5 dòng cuối log.";

pub(super) const HELP_CONTEXT_PREFIX: &str = "Ngữ cảnh gần đây mình thấy:";

pub(super) const QUESTION_CHOICE: &str =
    "Bạn muốn câu trả lời theo kiểu A) nhanh gọn 3 ý, hay B) chi tiết từng bước?";

pub(super) const QUESTION_CONTEXT_PREFIX: &str = "Ngữ cảnh:";

pub(super) const DEFAULT_PROMPT: &str =
    "Bạn muốn mình góp ý hướng giải quyết, hay bạn chỉ cần mình lắng nghe?";

// --- Persona phrase sets ---

pub(super) const SWEET_OPEN: &[&str] = &["Dạ nè 🥰", "Có em đây ✨", "Mình ơi 🫶", "Em nghe nè 💛"];
pub(super) const SWEET_CLOSE: &[&str] = &[
    "Mình kể thêm nha?",
    "Em ở đây với mình.",
    "Mình muốn em giúp gì tiếp nè?",
];

pub(super) const BLUNT_OPEN: &[&str] = &["Ok.", "Nghe đây.", "Nói thẳng:", "Mình chốt thế này:"];
pub(super) const BLUNT_CLOSE: &[&str] = &[
    "Trả lời 2 ý là đủ.",
    "Đưa thêm dữ kiện.",
    "Muốn nhanh hay chi tiết?",
];

pub(super) const SASSY_OPEN: &[&str] = &["Ờm…", "Rồi, nghe nè 😏", "Từ từ đã 🙃", "Ok ok 😼"];
pub(super) const SASSY_CLOSE: &[&str] = &[
    "Nói rõ hơn coi.",
    "Đừng mơ hồ.",
    "Đưa log/chi tiết lên.",
    "Chốt lại mục tiêu?",
];
