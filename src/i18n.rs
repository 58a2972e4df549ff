//! UI strings per language and the personalized greeting

use crate::session::{Language, SessionConfig};
use serde::Serialize;

/// Shown under the headline once the candles are out and no message was set
pub const CELEBRATION_FLOURISH: &str = "✧ 🎂 🎊 🎉 ✨ ✧";

/// Static UI text for one language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub choose_cake: &'static str,
    pub choose_candle: &'static str,
    pub classic: &'static str,
    pub digits: &'static str,
    pub number_of_candles: &'static str,
    pub digit_value: &'static str,
    pub blow_prompt: &'static str,
    pub celebrate: &'static str,
    pub reset: &'static str,
    pub upload_custom: &'static str,
}

const EN: Translation = Translation {
    title: "Lumina Birthday",
    subtitle: "Make a wish and blow out the candles",
    choose_cake: "Select Your Cake",
    choose_candle: "Candle Style",
    classic: "Classic",
    digits: "Digits",
    number_of_candles: "Number of Candles",
    digit_value: "Enter Digits",
    blow_prompt: "Blow into your mic to extinguish the flames!",
    celebrate: "Happy Birthday!",
    reset: "Light Again",
    upload_custom: "Upload/Paste Your Cake",
};

const ZH: Translation = Translation {
    title: "华光生日",
    subtitle: "许下愿望，吹灭蜡烛",
    choose_cake: "选择蛋糕",
    choose_candle: "蜡烛款式",
    classic: "经典",
    digits: "数字",
    number_of_candles: "蜡烛数量",
    digit_value: "输入数字",
    blow_prompt: "对着麦克风吹气来熄灭蜡烛！",
    celebrate: "生日快乐！",
    reset: "重新点亮",
    upload_custom: "上传/粘贴蛋糕",
};

const JA: Translation = Translation {
    title: "ルミナ・バースデー",
    subtitle: "願いを込めて、ろうそくを吹き消して",
    choose_cake: "ケーキを選ぶ",
    choose_candle: "キャンドルのスタイル",
    classic: "クラシック",
    digits: "数字",
    number_of_candles: "ろうそくの数",
    digit_value: "数字を入力",
    blow_prompt: "マイクに息を吹きかけて、ろうそくを消しましょう！",
    celebrate: "お誕生日おめでとう！",
    reset: "もう一度点灯",
    upload_custom: "アップロード/貼り付け",
};

const FR: Translation = Translation {
    title: "Lumina Anniversaire",
    subtitle: "Faites un vœu et soufflez les bougies",
    choose_cake: "Choisissez votre gâteau",
    choose_candle: "Style de bougie",
    classic: "Classique",
    digits: "Chiffres",
    number_of_candles: "Nombre de bougies",
    digit_value: "Entrez les chiffres",
    blow_prompt: "Soufflez dans votre micro pour éteindre les flammes !",
    celebrate: "Joyeux Anniversaire !",
    reset: "Rallumer",
    upload_custom: "Téléverser/Coller",
};

const AR: Translation = Translation {
    title: "لومينا ميلاد",
    subtitle: "تمنى أمنية وأطفئ الشموع",
    choose_cake: "اختر كعكتك",
    choose_candle: "نمط الشمع",
    classic: "كلاسيكي",
    digits: "أرقام",
    number_of_candles: "عدد الشموع",
    digit_value: "أدخل الأرقام",
    blow_prompt: "انفخ في الميكروفون لإطفاء الشموع!",
    celebrate: "عيد ميلاد سعيد!",
    reset: "أشعلها مرة أخرى",
    upload_custom: "رفع/لصق كعكتك",
};

pub fn translation(lang: Language) -> Translation {
    match lang {
        Language::En => EN,
        Language::Zh => ZH,
        Language::Ja => JA,
        Language::Fr => FR,
        Language::Ar => AR,
    }
}

/// Entry in the language switcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageOption {
    pub code: Language,
    pub name: &'static str,
    pub rtl: bool,
}

pub fn languages() -> Vec<LanguageOption> {
    Language::ALL
        .iter()
        .map(|&code| LanguageOption {
            code,
            name: code.native_name(),
            rtl: code.is_rtl(),
        })
        .collect()
}

/// Header text above the cake
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Greeting {
    pub headline: String,
    pub message: String,
    /// Giver's name, when one was entered
    pub from: Option<String>,
    /// Text direction of the session language
    pub rtl: bool,
}

/// Build the header for `session`: the recipient's name and message while
/// the candles burn, a birthday wish once they are out, and the generic
/// title and subtitle when nothing was personalized.
pub fn greeting(session: &SessionConfig) -> Greeting {
    let t = translation(session.lang);
    let name = session.user_name.trim();
    let message = session.custom_message.trim();
    let giver = session.giver_name.trim();

    let (headline, message) = if session.is_extinguished {
        let headline = if name.is_empty() {
            t.celebrate.to_string()
        } else {
            format!("{} {}!", t.celebrate, name)
        };
        let message = if message.is_empty() {
            CELEBRATION_FLOURISH
        } else {
            message
        };
        (headline, message.to_string())
    } else {
        let headline = if name.is_empty() { t.title } else { name };
        let message = if message.is_empty() { t.subtitle } else { message };
        (headline.to_string(), message.to_string())
    };

    Greeting {
        headline,
        message,
        from: (!giver.is_empty()).then(|| giver.to_string()),
        rtl: session.lang.is_rtl(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_has_its_own_strings() {
        let titles: Vec<_> = Language::ALL.iter().map(|&l| translation(l).title).collect();
        let mut unique = titles.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), titles.len());
        assert_eq!(translation(Language::Fr).celebrate, "Joyeux Anniversaire !");
    }

    #[test]
    fn switcher_lists_all_languages_with_direction() {
        let options = languages();
        assert_eq!(options.len(), 5);
        let rtl: Vec<_> = options.iter().filter(|o| o.rtl).map(|o| o.code).collect();
        assert_eq!(rtl, vec![Language::Ar]);
        assert!(options.iter().any(|o| o.name == "日本語"));
    }

    #[test]
    fn unpersonalized_session_uses_title_and_subtitle() {
        let session = SessionConfig::default();
        let g = greeting(&session);

        assert_eq!(g.headline, "Lumina Birthday");
        assert_eq!(g.message, "Make a wish and blow out the candles");
        assert_eq!(g.from, None);
        assert!(!g.rtl);
    }

    #[test]
    fn lit_cake_shows_name_and_message() {
        let mut session = SessionConfig::default();
        session.user_name = "  Mia ".to_string();
        session.custom_message = "Many happy returns".to_string();
        session.giver_name = "Sam".to_string();

        let g = greeting(&session);
        assert_eq!(g.headline, "Mia");
        assert_eq!(g.message, "Many happy returns");
        assert_eq!(g.from.as_deref(), Some("Sam"));
    }

    #[test]
    fn extinguished_cake_wishes_happy_birthday() {
        let mut session = SessionConfig::for_language(Language::Ja);
        session.is_extinguished = true;

        let g = greeting(&session);
        assert_eq!(g.headline, "お誕生日おめでとう！");
        assert_eq!(g.message, CELEBRATION_FLOURISH);

        session.user_name = "Aiko".to_string();
        session.custom_message = "Have a great year".to_string();
        let g = greeting(&session);
        assert_eq!(g.headline, "お誕生日おめでとう！ Aiko!");
        assert_eq!(g.message, "Have a great year");
    }

    #[test]
    fn arabic_greeting_is_right_to_left() {
        let session = SessionConfig::for_language(Language::Ar);
        let g = greeting(&session);
        assert!(g.rtl);
        assert_eq!(g.headline, "لومينا ميلاد");
    }
}
