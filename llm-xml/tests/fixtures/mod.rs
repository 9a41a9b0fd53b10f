//! Records shared by the integration tests, with the templates they encode to
//! and replies a model might send back.

#![allow(dead_code)]

use indoc::indoc;
use llm_xml::{FieldDecl, LlmSchema, RecordSchema};
use serde::{Deserialize, Serialize};

// ============================================================================
// Greeting
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Greeting {
    pub from: String,
    pub to: String,
    pub messages: Vec<Message>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub index: i32,
    pub content: String,
}

impl LlmSchema for Greeting {
    fn llm_schema() -> RecordSchema {
        RecordSchema::new("Greeting")
            .field(FieldDecl::scalar("from").prompt("the name of the greeter"))
            .field(FieldDecl::scalar("to").prompt("the name of the person being greeted"))
            .field(FieldDecl::list("messages").nested::<Message>())
    }
}

impl LlmSchema for Message {
    fn llm_schema() -> RecordSchema {
        RecordSchema::new("Message")
            .field(FieldDecl::scalar("index").prompt("the index for this greeting content entry"))
            .field(FieldDecl::scalar("content").prompt("the greeting content for this index"))
    }
}

pub fn message(index: i32, content: &str) -> Message {
    Message {
        index,
        content: content.to_string(),
    }
}

pub fn greeting(messages: Vec<Message>) -> Greeting {
    Greeting {
        from: "AI".to_string(),
        to: "Human".to_string(),
        messages,
    }
}

pub const GREETING_PROMPT: &str = indoc! {r#"
    <Greeting>
      <from>{... the name of the greeter ...}</from>
      <to>{... the name of the person being greeted ...}</to>
      <messages>
        <Message>
          <index>{... the index for this greeting content entry ...}</index>
          <content>{... the greeting content for this index ...}</content>
        </Message>
        {... other "Message" entries ...}
      </messages>
    </Greeting>"#};

pub const GREETING_ONE: &str = indoc! {"
    <Greeting>
      <from>AI</from>
      <to>Human</to>
      <messages>
        <Message>
          <index>0</index>
          <content>Hello, how can I assist you today?</content>
        </Message>
      </messages>
    </Greeting>"};

pub const GREETING_TWO: &str = indoc! {"
    <Greeting>
      <from>AI</from>
      <to>Human</to>
      <messages>
        <Message>
          <index>0</index>
          <content>Hello, how can I assist you today?</content>
        </Message>
        <Message>
          <index>1</index>
          <content>I'm here to help with any questions you may have.</content>
        </Message>
      </messages>
    </Greeting>"};

pub const GREETING_NO_LIST: &str = indoc! {"
    <Greeting>
      <from>AI</from>
      <to>Human</to>
    </Greeting>"};

pub const GREETING_EMPTY_LIST: &str = indoc! {"
    <Greeting>
      <from>AI</from>
      <to>Human</to>
      <messages></messages>
    </Greeting>"};

// ============================================================================
// Recipe
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<Step>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub name: String,
    pub quantity: String,
    pub unit: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Step {
    pub text: String,
}

impl LlmSchema for Recipe {
    fn llm_schema() -> RecordSchema {
        RecordSchema::new("Recipe")
            .field(FieldDecl::scalar("name").prompt("the name of the recipe"))
            .field(FieldDecl::scalar("description").prompt("a brief description of the recipe"))
            .field(FieldDecl::list("ingredients").nested::<Ingredient>())
            .field(
                FieldDecl::list("instructions")
                    .prompt("all of the steps required to prepare the recipe")
                    .nested::<Step>(),
            )
    }
}

impl LlmSchema for Ingredient {
    fn llm_schema() -> RecordSchema {
        RecordSchema::new("Ingredient")
            .field(FieldDecl::scalar("name").prompt("the name of the ingredient"))
            .field(FieldDecl::scalar("quantity").prompt("the quantity of the ingredient"))
            .field(FieldDecl::scalar("unit").prompt("the unit of measurement for the ingredient"))
    }
}

impl LlmSchema for Step {
    fn llm_schema() -> RecordSchema {
        RecordSchema::new("Step").field(
            FieldDecl::scalar("text").prompt("one step in the instructions for the recipe"),
        )
    }
}

pub fn cookies() -> Recipe {
    Recipe {
        name: "Chocolate Chip Cookies".to_string(),
        description: "Delicious homemade chocolate chip cookies".to_string(),
        ingredients: vec![
            Ingredient {
                name: "All-purpose flour".to_string(),
                quantity: "2 1/4".to_string(),
                unit: "cups".to_string(),
            },
            Ingredient {
                name: "Chocolate chips".to_string(),
                quantity: "2".to_string(),
                unit: "cups".to_string(),
            },
        ],
        instructions: vec![
            Step {
                text: "Preheat oven to 375°F (190°C)".to_string(),
            },
            Step {
                text: "Mix ingredients and bake for 9-11 minutes".to_string(),
            },
        ],
    }
}

pub const RECIPE_PROMPT: &str = indoc! {r#"
    <Recipe>
      <name>{... the name of the recipe ...}</name>
      <description>{... a brief description of the recipe ...}</description>
      <ingredients>
        <Ingredient>
          <name>{... the name of the ingredient ...}</name>
          <quantity>{... the quantity of the ingredient ...}</quantity>
          <unit>{... the unit of measurement for the ingredient ...}</unit>
        </Ingredient>
        {... other "Ingredient" entries ...}
      </ingredients>
      <instructions>
        {... all of the steps required to prepare the recipe ...}
        <Step>
          <text>{... one step in the instructions for the recipe ...}</text>
        </Step>
        {... other "Step" entries ...}
      </instructions>
    </Recipe>"#};

pub const RECIPE_REPLY: &str = indoc! {"
    <Recipe>
      <name>Chocolate Chip Cookies</name>
      <description>Delicious homemade chocolate chip cookies</description>
      <ingredients>
        <Ingredient>
          <name>All-purpose flour</name>
          <quantity>2 1/4</quantity>
          <unit>cups</unit>
        </Ingredient>
        <Ingredient>
          <name>Chocolate chips</name>
          <quantity>2</quantity>
          <unit>cups</unit>
        </Ingredient>
      </ingredients>
      <instructions>
        <Step>
          <text>Preheat oven to 375°F (190°C)</text>
        </Step>
        <Step>
          <text>Mix ingredients and bake for 9-11 minutes</text>
        </Step>
      </instructions>
    </Recipe>"};

// ============================================================================
// Coaching feedback
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename = "point", default)]
pub struct ObservationPoint {
    pub observation: String,
    pub advice: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename = "coach_feedback", default)]
pub struct CoachResult {
    #[serde(skip_serializing)]
    pub timestamp: i64,
    pub overview: Vec<String>,
    pub positive_feedback: Vec<String>,
    pub improvements: Vec<ObservationPoint>,
    pub action_items: Vec<String>,
}

impl LlmSchema for ObservationPoint {
    fn llm_schema() -> RecordSchema {
        RecordSchema::new("point")
            .field(FieldDecl::scalar("observation").prompt("Area that needs improvement"))
            .field(FieldDecl::scalar("advice").prompt("Specific advice to address this area"))
    }
}

impl LlmSchema for CoachResult {
    fn llm_schema() -> RecordSchema {
        RecordSchema::new("coach_feedback")
            .field(
                FieldDecl::list("overview")
                    .prompt("")
                    .element_tag("point")
                    .element_prompt("Key observation about the user's day"),
            )
            .field(
                FieldDecl::list("positive_feedback")
                    .element_tag("point")
                    .element_prompt("Positive habit or behavior observed"),
            )
            .field(
                FieldDecl::list("improvements")
                    .tag("areas_for_improvement")
                    .element_tag("")
                    .element_prompt("Area that needs improvement")
                    .nested::<ObservationPoint>(),
            )
            .field(
                FieldDecl::list("action_items")
                    .element_tag("item")
                    .element_prompt("Concrete action for the user to implement"),
            )
    }
}

pub fn coaching() -> CoachResult {
    CoachResult {
        timestamp: 0,
        overview: vec![
            "Your day showed a mix of productivity and potential areas for improvement."
                .to_string(),
            "You demonstrated good focus during work hours but had some challenges with time management."
                .to_string(),
        ],
        positive_feedback: vec![
            "Great job on completing that challenging project ahead of schedule!".to_string(),
            "You maintained a consistent exercise routine, which is excellent for your overall well-being."
                .to_string(),
        ],
        improvements: vec![
            ObservationPoint {
                observation:
                    "You spent a significant amount of time on social media during work hours."
                        .to_string(),
                advice: "Try using a website blocker or app to limit social media access during designated work periods."
                    .to_string(),
            },
            ObservationPoint {
                observation:
                    "Your sleep schedule seems irregular, with late nights affecting morning productivity."
                        .to_string(),
                advice: "Aim for a consistent sleep schedule, going to bed and waking up at the same time each day to improve your energy levels."
                    .to_string(),
            },
        ],
        action_items: vec![
            "Set up a website blocker to limit social media access between 9 AM and 5 PM."
                .to_string(),
            "Establish a bedtime routine and aim to be in bed by 10:30 PM each night.".to_string(),
            "Schedule short breaks every 90 minutes during work to maintain focus and avoid burnout."
                .to_string(),
        ],
    }
}

pub const COACH_PROMPT: &str = indoc! {r#"
    <coach_feedback>
      <overview>
        <point>{... Key observation about the user's day ...}</point>
        {... other "point" entries ...}
      </overview>
      <positive_feedback>
        <point>{... Positive habit or behavior observed ...}</point>
        {... other "point" entries ...}
      </positive_feedback>
      <areas_for_improvement>
        <point>
          <observation>{... Area that needs improvement ...}</observation>
          <advice>{... Specific advice to address this area ...}</advice>
        </point>
        {... other "point" entries ...}
      </areas_for_improvement>
      <action_items>
        <item>{... Concrete action for the user to implement ...}</item>
        {... other "item" entries ...}
      </action_items>
    </coach_feedback>"#};

pub const COACH_REPLY: &str = indoc! {"
    <coach_feedback>
        <overview>
            <point>Your day showed a mix of productivity and potential areas for improvement.</point>
            <point>You demonstrated good focus during work hours but had some challenges with time management.</point>
        </overview>
        <positive_feedback>
            <point>Great job on completing that challenging project ahead of schedule!</point>
            <point>You maintained a consistent exercise routine, which is excellent for your overall well-being.</point>
        </positive_feedback>
        <areas_for_improvement>
            <point>
                <observation>You spent a significant amount of time on social media during work hours.</observation>
                <advice>Try using a website blocker or app to limit social media access during designated work periods.</advice>
            </point>
            <point>
                <observation>Your sleep schedule seems irregular, with late nights affecting morning productivity.</observation>
                <advice>Aim for a consistent sleep schedule, going to bed and waking up at the same time each day to improve your energy levels.</advice>
            </point>
        </areas_for_improvement>
        <action_items>
            <item>Set up a website blocker to limit social media access between 9 AM and 5 PM.</item>
            <item>Establish a bedtime routine and aim to be in bed by 10:30 PM each night.</item>
            <item>Schedule short breaks every 90 minutes during work to maintain focus and avoid burnout.</item>
        </action_items>
    </coach_feedback>"};

// ============================================================================
// Email suggestions
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EmailsResults {
    pub emails: Vec<EmailResult>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename = "email", default)]
pub struct EmailResult {
    #[serde(skip_serializing)]
    pub timestamp: i64,
    pub email_number: i32,
    pub recipient_name: String,
    pub recipient_email: String,
    pub suggested_subject: String,
    pub suggested_message: String,
    pub time_to_send: String,
    pub explanation: String,
}

impl LlmSchema for EmailsResults {
    fn llm_schema() -> RecordSchema {
        RecordSchema::new("EmailsResults")
            .field(FieldDecl::list("emails").nested::<EmailResult>())
    }
}

impl LlmSchema for EmailResult {
    fn llm_schema() -> RecordSchema {
        RecordSchema::new("email")
            .field(
                FieldDecl::scalar("email_number")
                    .tag("emailNumber")
                    .prompt("the index for this email"),
            )
            .field(
                FieldDecl::scalar("recipient_name")
                    .tag("recipientName")
                    .prompt("the name of the recipient"),
            )
            .field(
                FieldDecl::scalar("recipient_email")
                    .tag("recipientEmail")
                    .prompt("the email address of the recipient"),
            )
            .field(
                FieldDecl::scalar("suggested_subject")
                    .tag("suggestedSubject")
                    .prompt("the suggested subject line"),
            )
            .field(
                FieldDecl::scalar("suggested_message")
                    .tag("suggestedMessage")
                    .prompt("the suggested email message content"),
            )
            .field(
                FieldDecl::scalar("time_to_send")
                    .tag("timeToSend")
                    .prompt("YYYY-MM-DD HH:MM:SS"),
            )
            .field(
                FieldDecl::scalar("explanation")
                    .prompt("Brief explanation for this contact suggestion"),
            )
    }
}

pub fn follow_up() -> EmailsResults {
    EmailsResults {
        emails: vec![EmailResult {
            timestamp: 0,
            email_number: 1,
            recipient_name: "John Doe".to_string(),
            recipient_email: "john@example.com".to_string(),
            suggested_subject: "Meeting Follow-up".to_string(),
            suggested_message: "Thank you for your time today...".to_string(),
            time_to_send: "2023-06-15 14:30:00".to_string(),
            explanation: "Follow up after the project meeting".to_string(),
        }],
    }
}

pub const EMAIL_PROMPT: &str = indoc! {r#"
    <EmailsResults>
      <emails>
        <email>
          <emailNumber>{... the index for this email ...}</emailNumber>
          <recipientName>{... the name of the recipient ...}</recipientName>
          <recipientEmail>{... the email address of the recipient ...}</recipientEmail>
          <suggestedSubject>{... the suggested subject line ...}</suggestedSubject>
          <suggestedMessage>{... the suggested email message content ...}</suggestedMessage>
          <timeToSend>{... YYYY-MM-DD HH:MM:SS ...}</timeToSend>
          <explanation>{... Brief explanation for this contact suggestion ...}</explanation>
        </email>
        {... other "email" entries ...}
      </emails>
    </EmailsResults>"#};

pub const EMAIL_REPLY: &str = indoc! {"
    <EmailsResults>
      <emails>
        <email>
          <emailNumber>1</emailNumber>
          <recipientName>John Doe</recipientName>
          <recipientEmail>john@example.com</recipientEmail>
          <suggestedSubject>Meeting Follow-up</suggestedSubject>
          <suggestedMessage>Thank you for your time today...</suggestedMessage>
          <timeToSend>2023-06-15 14:30:00</timeToSend>
          <explanation>Follow up after the project meeting</explanation>
        </email>
      </emails>
    </EmailsResults>"};
