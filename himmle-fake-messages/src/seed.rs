use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use himmle_common::{Chat, ChatStore, Message, User, CURRENT_USER};
use rand::prelude::{Rng, SliceRandom};

struct UserSeed {
    id: &'static str,
    username: &'static str,
    display_name: &'static str,
    online: bool,
    date_of_birth: &'static str,
    location: &'static str,
    profession: &'static str,
    hobby: &'static str,
    bio: &'static str,
}

const USERS: &[UserSeed] = &[
    UserSeed {
        id: "user1",
        username: "johnsmith",
        display_name: "John Smith",
        online: true,
        date_of_birth: "9.11.2001",
        location: "New-York",
        profession: "airline pilot",
        hobby: "firecracker development",
        bio: "Weekend pyrotechnician, weekday pilot. Ask me about the view from 35,000 feet.",
    },
    UserSeed {
        id: "user2",
        username: "sarahjohnson",
        display_name: "Sarah Johnson",
        online: false,
        date_of_birth: "15.04.1995",
        location: "Los Angeles",
        profession: "graphic designer",
        hobby: "photography",
        bio: "Creative mind with a passion for visual storytelling.",
    },
    UserSeed {
        id: "user3",
        username: "mikepeters",
        display_name: "Mike Peters",
        online: false,
        date_of_birth: "22.07.1988",
        location: "Chicago",
        profession: "software engineer",
        hobby: "gaming",
        bio: "Code by day, game by night. Coffee enthusiast.",
    },
    UserSeed {
        id: "user4",
        username: "annawilliams",
        display_name: "Anna Williams",
        online: false,
        date_of_birth: "03.12.1992",
        location: "Miami",
        profession: "fitness trainer",
        hobby: "cooking",
        bio: "Helping people achieve their fitness goals. Food lover.",
    },
    UserSeed {
        id: "user5",
        username: "davidchen",
        display_name: "David Chen",
        online: false,
        date_of_birth: "18.09.1990",
        location: "San Francisco",
        profession: "marketing manager",
        hobby: "hiking",
        bio: "Outdoor enthusiast and digital marketer. Always exploring new trails.",
    },
    UserSeed {
        id: "user6",
        username: "emilybrown",
        display_name: "Emily Brown",
        online: true,
        date_of_birth: "27.06.1993",
        location: "Seattle",
        profession: "teacher",
        hobby: "painting",
        bio: "Elementary school teacher with a love for art and creativity.",
    },
    UserSeed {
        id: "user7",
        username: "alexturner",
        display_name: "Alex Turner",
        online: false,
        date_of_birth: "05.02.1985",
        location: "Austin",
        profession: "musician",
        hobby: "travel",
        bio: "Guitarist and songwriter. Collecting stories from around the world.",
    },
    UserSeed {
        id: "user8",
        username: "sophiagarcia",
        display_name: "Sophia Garcia",
        online: true,
        date_of_birth: "11.11.1991",
        location: "Denver",
        profession: "architect",
        hobby: "skiing",
        bio: "Designing spaces and hitting the slopes whenever possible.",
    },
    UserSeed {
        id: "user9",
        username: "jacobmiller",
        display_name: "Jacob Miller",
        online: false,
        date_of_birth: "30.08.1987",
        location: "Boston",
        profession: "lawyer",
        hobby: "reading",
        bio: "Legal professional with a passion for classic literature.",
    },
    UserSeed {
        id: "user10",
        username: "oliviaroberts",
        display_name: "Olivia Roberts",
        online: true,
        date_of_birth: "14.05.1994",
        location: "Portland",
        profession: "chef",
        hobby: "gardening",
        bio: "From garden to table. Creating culinary experiences with fresh ingredients.",
    },
    UserSeed {
        id: "user11",
        username: "willsmith",
        display_name: "William Smith",
        online: false,
        date_of_birth: "22.03.1989",
        location: "Philadelphia",
        profession: "doctor",
        hobby: "running",
        bio: "Healthcare professional and marathon runner. Advocating for healthy lifestyles.",
    },
    UserSeed {
        id: "user12",
        username: "emmawatson",
        display_name: "Emma Watson",
        online: false,
        date_of_birth: "19.10.1996",
        location: "Nashville",
        profession: "singer",
        hobby: "yoga",
        bio: "Finding harmony in music and mindfulness. Studio sessions and sunset yoga.",
    },
    UserSeed {
        id: "user13",
        username: "maxcroft",
        display_name: "Max Croft",
        online: true,
        date_of_birth: "07.01.1984",
        location: "Detroit",
        profession: "engineer",
        hobby: "woodworking",
        bio: "Building bridges by day and furniture by night. Craftsman at heart.",
    },
    UserSeed {
        id: "user14",
        username: "lucylee",
        display_name: "Lucy Lee",
        online: false,
        date_of_birth: "24.12.1993",
        location: "Minneapolis",
        profession: "photographer",
        hobby: "surfing",
        bio: "Capturing moments through my lens. Ocean lover and adventure seeker.",
    },
];

const FIRST_MESSAGES: &[&str] = &[
    "Привет! Как дела?",
    "Здравствуй! Давно не виделись.",
    "Привет, ты свободен на выходных?",
    "Доброе утро! Как прошел твой день?",
    "Здравствуй! Нужно обсудить один вопрос.",
    "Привет! Видел новости сегодня?",
    "Хей! Как прошла встреча?",
    "Доброго времени суток! Есть минутка?",
    "Привет, помнишь о нашей договоренности?",
    "Здравствуй! Хотел узнать твое мнение.",
];

const REPLY_MESSAGES: &[&str] = &[
    "Привет! Все отлично, спасибо! У тебя как?",
    "Здравствуй! Да, давненько. Что нового?",
    "Привет! Да, должен быть свободен. А что планируется?",
    "Доброе утро! День только начался, но пока всё хорошо.",
    "Привет! Конечно, о чем речь?",
    "Да, видел. Это что-то невероятное!",
    "Встреча прошла успешно, спасибо что спросил!",
    "Привет! Да, минутка есть. Что случилось?",
    "Конечно помню, не переживай.",
    "Привет! Конечно, я всегда рад помочь советом.",
];

const FOLLOW_UP_MESSAGES: &[&str] = &[
    "Отлично! Хотел предложить встретиться на выходных.",
    "У меня все по-старому. Работа, дом...",
    "Думаю собраться небольшой компанией в парке.",
    "Рад слышать! У меня тоже день начался неплохо.",
    "Мне нужна твоя помощь с одним проектом.",
    "Да, я был в шоке, когда увидел эту новость!",
    "Босс остался доволен презентацией.",
    "Возникли некоторые проблемы с заказом.",
    "Встречаемся завтра в 6, как договаривались?",
    "Спасибо! Тогда вот что я думаю по этому поводу...",
];

const LATEST_MESSAGES: &[&str] = &[
    "Кстати, не забудь взять с собой документы.",
    "Чуть не забыл спросить - ты идешь завтра?",
    "Только что получил сообщение от Алекса, он тоже придет.",
    "Напомни мне об этом завтра, пожалуйста.",
    "Вышлю тебе все детали по email.",
    "Извини, мне нужно бежать. Поговорим позже!",
    "Только что видел эту новость! Невероятно!",
    "Чуть не забыл - с днем рождения!",
    "Можешь скинуть мне ссылку на тот сайт?",
    "Кстати, я завтра буду в твоем районе.",
];

struct GroupSeed {
    id: &'static str,
    name: &'static str,
    members: &'static [&'static str],
    /// `(sender, content, seconds before now, is_read)`
    messages: &'static [(&'static str, &'static str, i64, bool)],
}

const GROUP_CHATS: &[GroupSeed] = &[
    GroupSeed {
        id: "groupChat1",
        name: "Друзья",
        members: &[CURRENT_USER, "user1", "user2", "user3"],
        messages: &[
            ("user2", "Привет всем! Какие планы на выходные?", 7200, true),
            (CURRENT_USER, "Я свободен в субботу после обеда", 5400, true),
            ("user3", "Можно встретиться в парке", 3600, true),
            ("user1", "Всем привет! Когда встречаемся?", 1800, false),
        ],
    },
    GroupSeed {
        id: "groupChat2",
        name: "Рабочий проект",
        members: &[CURRENT_USER, "user4", "user5", "user6", "user7"],
        messages: &[
            ("user5", "Коллеги, нам нужно подготовить презентацию к понедельнику", 10800, true),
            (CURRENT_USER, "Я могу подготовить первые 5 слайдов", 9000, true),
            ("user6", "Я возьму на себя финансовый раздел", 5400, true),
            ("user4", "Я всем отправил документы по email", 900, true),
        ],
    },
];

/// Builds the demo store. All timestamps are relative to `now`, and every random choice
/// (template texts, message ids) is drawn from `rng`, so a seeded rng gives a reproducible store.
pub fn seed_store<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> ChatStore {
    let users = USERS.iter().map(UserSeed::to_user).collect::<Vec<_>>();
    let mut chats = Vec::with_capacity(users.len() + GROUP_CHATS.len());
    let mut messages = HashMap::new();

    for (i, user) in (1..).zip(&users) {
        let chat_id: Arc<str> = format!("chat{i}").into();
        let message = |id: Arc<str>, sender: &Arc<str>, content: &str, ago: Duration, is_read| {
            Message {
                id,
                sender_id: sender.clone(),
                chat_id: chat_id.clone(),
                content: content.into(),
                timestamp: now - ago,
                is_read,
                attachments: None,
            }
        };
        let current: Arc<str> = CURRENT_USER.into();

        let first = FIRST_MESSAGES[(i - 1) % FIRST_MESSAGES.len()];
        let mut sequence = vec![
            message(random_id(rng), &user.id, first, Duration::hours(2), true),
            message(
                random_id(rng),
                &current,
                pick(rng, REPLY_MESSAGES),
                Duration::hours(1),
                true,
            ),
        ];
        if i % 3 == 0 {
            let content = pick(rng, FOLLOW_UP_MESSAGES);
            let is_read = i % 2 == 0;
            let id = random_id(rng);
            sequence.push(message(id, &user.id, content, Duration::minutes(30), is_read));
        }
        if i % 2 == 0 {
            let content = pick(rng, LATEST_MESSAGES);
            let id = random_id(rng);
            sequence.push(message(id, &user.id, content, Duration::minutes(5), false));
        }

        let created_at = now - Duration::days(i as i64);
        let mut chat = Chat::direct(chat_id.clone(), user.id.clone(), created_at);
        if let Some(last) = sequence.last() {
            chat.updated_at = last.timestamp;
        }
        chats.push(chat);
        messages.insert(chat_id, sequence);
    }

    for group in GROUP_CHATS {
        let members = group.members.iter().map(|&id| Arc::<str>::from(id));
        chats.push(Chat::group(group.id, members, group.name, now));
        let sequence = group
            .messages
            .iter()
            .map(|&(sender, content, seconds_ago, is_read)| Message {
                id: random_id(rng),
                sender_id: sender.into(),
                chat_id: group.id.into(),
                content: content.into(),
                timestamp: now - Duration::seconds(seconds_ago),
                is_read,
                attachments: None,
            })
            .collect();
        messages.insert(group.id.into(), sequence);
    }

    tracing::debug!(users = users.len(), chats = chats.len(), "seeded mock data");
    ChatStore::from_parts(users, chats, messages)
}

impl UserSeed {
    fn to_user(&self) -> User {
        let mut user = User::new(self.id, self.username, self.display_name);
        user.is_online = self.online;
        user.date_of_birth = Some(self.date_of_birth.into());
        user.location = Some(self.location.into());
        user.profession = Some(self.profession.into());
        user.hobby = Some(self.hobby.into());
        user.bio = Some(self.bio.into());
        user
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, templates: &[&'static str]) -> &'static str {
    // template lists are non-empty constants
    templates.choose(rng).copied().unwrap_or_default()
}

fn random_id<R: Rng + ?Sized>(rng: &mut R) -> Arc<str> {
    uuid::Builder::from_random_bytes(rng.gen())
        .into_uuid()
        .to_string()
        .into()
}
